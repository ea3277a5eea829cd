//! Interactive review session over a proposed partition.
//!
//! The active partition never holds an empty folder. Folders the user creates
//! without a photo are kept in a separate staged list (shown empty) and are
//! promoted into the partition by the first move into them. Names are unique
//! across both.

use serde::Serialize;

use crate::models::partition::Partition;
use crate::models::photo::PhotoMetadata;
use crate::safety::validate_folder_name;
use crate::services::query_classifier::StrategyType;
use crate::services::strategies;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceState {
    Idle,
    Proposed,
    Editing,
    Regenerating,
    Committing,
    Done,
}

impl std::fmt::Display for WorkspaceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Proposed => "proposed",
            Self::Editing => "editing",
            Self::Regenerating => "regenerating",
            Self::Committing => "committing",
            Self::Done => "done",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkspaceError {
    #[error("folder not found: {0}")]
    FolderNotFound(String),

    #[error("folder already exists: {0}")]
    FolderExists(String),

    #[error("folder name is blank")]
    BlankFolderName,

    #[error("not a usable folder name: {0}")]
    InvalidFolderName(String),

    #[error("photo {path} is not in folder {folder}")]
    PhotoNotFound { path: String, folder: String },

    #[error("no photo is waiting for a new folder")]
    NoPendingRequest,

    #[error("cannot {action} while workspace is {state}")]
    InvalidTransition {
        state: WorkspaceState,
        action: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingFolderRequest {
    pub photo_path: String,
    pub from_folder: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderView {
    pub name: String,
    pub photos: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    pub session_id: Option<String>,
    pub state: WorkspaceState,
    pub strategy: Option<StrategyType>,
    pub has_unsaved_ai_regeneration: bool,
    pub folders: Vec<FolderView>,
    pub pending: Option<PendingFolderRequest>,
}

/// Receives the accepted partition. Returns whether anything was written.
pub trait Materializer {
    type Report;

    fn materialize(&mut self, partition: &Partition) -> (bool, Self::Report);
}

#[derive(Debug, Clone)]
pub struct Workspace {
    state: WorkspaceState,
    session_id: Option<String>,
    strategy: Option<StrategyType>,
    partition: Partition,
    staged: Vec<String>,
    diverged: bool,
    pending: Option<PendingFolderRequest>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            state: WorkspaceState::Idle,
            session_id: None,
            strategy: None,
            partition: Partition::new(),
            staged: Vec::new(),
            diverged: false,
            pending: None,
        }
    }

    pub fn state(&self) -> WorkspaceState {
        self.state
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn staged_folders(&self) -> &[String] {
        &self.staged
    }

    pub fn has_unsaved_ai_regeneration(&self) -> bool {
        self.diverged
    }

    pub fn pending(&self) -> Option<&PendingFolderRequest> {
        self.pending.as_ref()
    }

    pub fn working_set(&self) -> Vec<PhotoMetadata> {
        self.partition.flatten()
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        let mut folders: Vec<FolderView> = self
            .partition
            .iter()
            .map(|(name, photos)| FolderView {
                name: name.to_string(),
                photos: photos.iter().map(|p| p.path.clone()).collect(),
            })
            .collect();
        folders.extend(self.staged.iter().map(|name| FolderView {
            name: name.clone(),
            photos: Vec::new(),
        }));

        WorkspaceSnapshot {
            session_id: self.session_id.clone(),
            state: self.state,
            strategy: self.strategy,
            has_unsaved_ai_regeneration: self.diverged,
            folders,
            pending: self.pending.clone(),
        }
    }

    fn require(
        &self,
        allowed: &[WorkspaceState],
        action: &'static str,
    ) -> Result<(), WorkspaceError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(WorkspaceError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }

    fn require_reviewable(&self, action: &'static str) -> Result<(), WorkspaceError> {
        self.require(&[WorkspaceState::Proposed, WorkspaceState::Editing], action)
    }

    fn mark_edited(&mut self) {
        self.state = WorkspaceState::Editing;
        self.diverged = true;
    }

    fn name_in_use(&self, name: &str) -> bool {
        self.partition.contains_folder(name) || self.staged.iter().any(|s| s == name)
    }

    fn staged_index(&self, name: &str) -> Option<usize> {
        self.staged.iter().position(|s| s == name)
    }

    fn validated_new_name(&self, name: &str) -> Result<String, WorkspaceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkspaceError::BlankFolderName);
        }
        self.check_free_name(name)?;
        Ok(name.to_string())
    }

    /// `name` must become exactly one directory under the base and be unused.
    fn check_free_name(&self, name: &str) -> Result<(), WorkspaceError> {
        if validate_folder_name(name).is_err() {
            return Err(WorkspaceError::InvalidFolderName(name.to_string()));
        }
        if self.name_in_use(name) {
            return Err(WorkspaceError::FolderExists(name.to_string()));
        }
        Ok(())
    }

    pub fn propose(&mut self, strategy: StrategyType, mut partition: Partition) -> Result<(), WorkspaceError> {
        self.require(&[WorkspaceState::Idle, WorkspaceState::Done], "start a session")?;
        partition.prune_empty();
        *self = Self {
            state: WorkspaceState::Proposed,
            session_id: Some(uuid::Uuid::new_v4().to_string()),
            strategy: Some(strategy),
            partition,
            ..Self::new()
        };
        log::debug!("workspace proposed with {} folders", self.partition.folder_count());
        Ok(())
    }

    pub fn move_photo(&mut self, photo_path: &str, from: &str, to: &str) -> Result<(), WorkspaceError> {
        self.require_reviewable("move a photo")?;
        if from == to {
            return Ok(());
        }
        let target_staged = self.staged_index(to);
        if !self.partition.contains_folder(to) && target_staged.is_none() {
            return Err(WorkspaceError::FolderNotFound(to.to_string()));
        }
        if !self.partition.contains_folder(from) {
            return Err(WorkspaceError::FolderNotFound(from.to_string()));
        }
        let photo = self
            .partition
            .take_photo(from, photo_path)
            .ok_or_else(|| WorkspaceError::PhotoNotFound {
                path: photo_path.to_string(),
                folder: from.to_string(),
            })?;

        if let Some(index) = target_staged {
            self.staged.remove(index);
        }
        self.partition.push(to, photo);
        self.forget_pending_photo(photo_path);
        self.mark_edited();
        log::debug!("moved {photo_path} from {from} to {to}");
        Ok(())
    }

    /// Plain creation: an empty folder staged for drops.
    pub fn create_folder(&mut self, name: &str) -> Result<(), WorkspaceError> {
        self.require_reviewable("create a folder")?;
        let name = self.validated_new_name(name)?;
        log::debug!("staged new folder {name}");
        self.staged.push(name);
        self.mark_edited();
        Ok(())
    }

    /// Parks one photo for creation-with-photo. Replaces any earlier request.
    pub fn request_folder_for_photo(&mut self, photo_path: &str, from: &str) -> Result<(), WorkspaceError> {
        self.require_reviewable("request a new folder")?;
        let in_folder = self
            .partition
            .folder(from)
            .ok_or_else(|| WorkspaceError::FolderNotFound(from.to_string()))?
            .iter()
            .any(|photo| photo.path == photo_path);
        if !in_folder {
            return Err(WorkspaceError::PhotoNotFound {
                path: photo_path.to_string(),
                folder: from.to_string(),
            });
        }
        self.pending = Some(PendingFolderRequest {
            photo_path: photo_path.to_string(),
            from_folder: from.to_string(),
        });
        Ok(())
    }

    pub fn cancel_pending_folder(&mut self) {
        self.pending = None;
    }

    /// Creates `name` holding the pending photo. On error the request stays.
    pub fn create_folder_with_pending_photo(&mut self, name: &str) -> Result<(), WorkspaceError> {
        self.require_reviewable("create a folder")?;
        let request = self.pending.clone().ok_or(WorkspaceError::NoPendingRequest)?;
        let name = self.validated_new_name(name)?;

        let photo = self
            .partition
            .take_photo(&request.from_folder, &request.photo_path)
            .ok_or_else(|| WorkspaceError::PhotoNotFound {
                path: request.photo_path.clone(),
                folder: request.from_folder.clone(),
            })?;
        self.partition.push(name.as_str(), photo);
        self.pending = None;
        self.mark_edited();
        log::debug!("created folder {name} with {}", request.photo_path);
        Ok(())
    }

    /// Blank or unchanged names are a no-op. Taken names are rejected.
    pub fn rename_folder(&mut self, old: &str, new: &str) -> Result<(), WorkspaceError> {
        self.require_reviewable("rename a folder")?;
        let new = new.trim();
        if new.is_empty() || new == old {
            return Ok(());
        }
        self.check_free_name(new)?;

        if let Some(index) = self.staged_index(old) {
            self.staged[index] = new.to_string();
        } else if !self.partition.rename_folder(old, new) {
            return Err(WorkspaceError::FolderNotFound(old.to_string()));
        }

        if let Some(pending) = self.pending.as_mut() {
            if pending.from_folder == old {
                pending.from_folder = new.to_string();
            }
        }
        self.mark_edited();
        log::debug!("renamed folder {old} to {new}");
        Ok(())
    }

    /// Re-clusters the current working set, ignoring prior folder identity.
    pub fn regenerate(&mut self) -> Result<(), WorkspaceError> {
        self.require_reviewable("re-organize")?;
        self.state = WorkspaceState::Regenerating;
        let working_set = self.partition.flatten();
        self.partition = strategies::regroup_in_thirds(&working_set);
        self.staged.clear();
        self.pending = None;
        self.diverged = false;
        self.strategy = Some(StrategyType::Custom);
        self.state = WorkspaceState::Proposed;
        log::info!(
            "re-organized {} photos into {} groups",
            working_set.len(),
            self.partition.folder_count()
        );
        Ok(())
    }

    /// Hands the partition to `materializer`. Empty staged folders are not
    /// part of it. A run that wrote nothing returns the session to editing.
    pub fn accept<M: Materializer>(&mut self, materializer: &mut M) -> Result<M::Report, WorkspaceError> {
        self.require_reviewable("accept")?;
        self.state = WorkspaceState::Committing;
        self.pending = None;
        let (success, report) = materializer.materialize(&self.partition);
        self.state = if success {
            WorkspaceState::Done
        } else {
            WorkspaceState::Editing
        };
        Ok(report)
    }

    pub fn cancel(&mut self) {
        log::debug!("workspace session cancelled in state {}", self.state);
        *self = Self::new();
    }

    fn forget_pending_photo(&mut self, photo_path: &str) {
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.photo_path == photo_path)
        {
            self.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::photo::test_support::photo;
    use crate::services::strategies::test_support::assert_exact_cover;

    fn proposed() -> (Workspace, Vec<PhotoMetadata>) {
        let photos: Vec<_> = (1..=5).map(|i| photo(&format!("{i}.jpg"))).collect();
        let mut partition = Partition::new();
        partition.push("A", photos[0].clone());
        partition.push("B", photos[1].clone());
        partition.push("B", photos[2].clone());
        partition.push("C", photos[3].clone());
        partition.push("C", photos[4].clone());

        let mut ws = Workspace::new();
        ws.propose(StrategyType::Scene, partition).unwrap();
        (ws, photos)
    }

    fn folder_names(ws: &Workspace) -> Vec<String> {
        ws.partition().folder_names().map(str::to_string).collect()
    }

    #[test]
    fn test_propose_starts_a_clean_session() {
        let (ws, photos) = proposed();
        assert_eq!(ws.state(), WorkspaceState::Proposed);
        assert!(!ws.has_unsaved_ai_regeneration());
        assert!(ws.snapshot().session_id.is_some());
        assert_exact_cover(&photos, ws.partition());
    }

    #[test]
    fn test_propose_rejected_mid_session() {
        let (mut ws, _) = proposed();
        let err = ws.propose(StrategyType::Date, Partition::new()).unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidTransition { .. }));
    }

    #[test]
    fn test_moving_the_only_photo_removes_source_folder() {
        let (mut ws, photos) = proposed();
        ws.move_photo("/photos/1.jpg", "A", "B").unwrap();

        assert!(!ws.partition().contains_folder("A"));
        let b = ws.partition().folder("B").unwrap();
        assert_eq!(b.last().unwrap().path, "/photos/1.jpg");
        assert_eq!(ws.state(), WorkspaceState::Editing);
        assert!(ws.has_unsaved_ai_regeneration());
        assert_exact_cover(&photos, ws.partition());
    }

    #[test]
    fn test_move_to_same_folder_is_noop() {
        let (mut ws, _) = proposed();
        ws.move_photo("/photos/1.jpg", "A", "A").unwrap();
        assert_eq!(ws.state(), WorkspaceState::Proposed);
        assert!(!ws.has_unsaved_ai_regeneration());
    }

    #[test]
    fn test_move_to_unknown_folder_is_rejected_without_changes() {
        let (mut ws, photos) = proposed();
        let err = ws.move_photo("/photos/1.jpg", "A", "Nowhere").unwrap_err();
        assert_eq!(err, WorkspaceError::FolderNotFound("Nowhere".to_string()));

        let err = ws.move_photo("/photos/9.jpg", "A", "B").unwrap_err();
        assert!(matches!(err, WorkspaceError::PhotoNotFound { .. }));
        assert_exact_cover(&photos, ws.partition());
        assert!(!ws.has_unsaved_ai_regeneration());
    }

    #[test]
    fn test_staged_folder_is_visible_then_promoted_by_move() {
        let (mut ws, photos) = proposed();
        ws.create_folder("  Trips ").unwrap();
        assert!(!ws.partition().contains_folder("Trips"));
        let snapshot = ws.snapshot();
        let trips = snapshot.folders.iter().find(|f| f.name == "Trips").unwrap();
        assert!(trips.photos.is_empty());

        ws.move_photo("/photos/2.jpg", "B", "Trips").unwrap();
        assert_eq!(ws.partition().folder("Trips").unwrap().len(), 1);
        assert!(ws.staged_folders().is_empty());
        assert_exact_cover(&photos, ws.partition());
    }

    #[test]
    fn test_create_folder_rejects_blank_and_taken_names() {
        let (mut ws, _) = proposed();
        assert_eq!(ws.create_folder("   ").unwrap_err(), WorkspaceError::BlankFolderName);
        assert_eq!(
            ws.create_folder("B").unwrap_err(),
            WorkspaceError::FolderExists("B".to_string())
        );
        ws.create_folder("New").unwrap();
        assert_eq!(
            ws.create_folder("New").unwrap_err(),
            WorkspaceError::FolderExists("New".to_string())
        );
    }

    #[test]
    fn test_path_like_folder_names_are_rejected() {
        let (mut ws, _) = proposed();
        for bad in ["a/b", "..", ".", "up\\down"] {
            assert_eq!(
                ws.create_folder(bad).unwrap_err(),
                WorkspaceError::InvalidFolderName(bad.to_string())
            );
            assert_eq!(
                ws.rename_folder("B", bad).unwrap_err(),
                WorkspaceError::InvalidFolderName(bad.to_string())
            );
        }

        ws.request_folder_for_photo("/photos/2.jpg", "B").unwrap();
        assert_eq!(
            ws.create_folder_with_pending_photo("../escape").unwrap_err(),
            WorkspaceError::InvalidFolderName("../escape".to_string())
        );
        assert!(ws.pending().is_some());
        assert_eq!(folder_names(&ws), vec!["A", "B", "C"]);
        assert!(!ws.has_unsaved_ai_regeneration());
    }

    #[test]
    fn test_create_with_photo_moves_pending_photo() {
        let (mut ws, photos) = proposed();
        ws.request_folder_for_photo("/photos/1.jpg", "A").unwrap();
        ws.create_folder_with_pending_photo("Favorites").unwrap();

        assert!(!ws.partition().contains_folder("A"));
        assert_eq!(ws.partition().folder("Favorites").unwrap()[0].path, "/photos/1.jpg");
        assert!(ws.pending().is_none());
        assert!(ws.has_unsaved_ai_regeneration());
        assert_exact_cover(&photos, ws.partition());
    }

    #[test]
    fn test_pending_request_is_single_slot() {
        let (mut ws, _) = proposed();
        ws.request_folder_for_photo("/photos/1.jpg", "A").unwrap();
        ws.request_folder_for_photo("/photos/4.jpg", "C").unwrap();
        ws.create_folder_with_pending_photo("Picked").unwrap();

        assert_eq!(ws.partition().folder("Picked").unwrap()[0].path, "/photos/4.jpg");
        assert!(ws.partition().contains_folder("A"));
    }

    #[test]
    fn test_failed_create_with_photo_keeps_request() {
        let (mut ws, _) = proposed();
        assert_eq!(
            ws.create_folder_with_pending_photo("X").unwrap_err(),
            WorkspaceError::NoPendingRequest
        );
        ws.request_folder_for_photo("/photos/2.jpg", "B").unwrap();
        assert!(ws.create_folder_with_pending_photo("C").is_err());
        assert!(ws.pending().is_some());

        ws.cancel_pending_folder();
        assert!(ws.pending().is_none());
    }

    #[test]
    fn test_moving_pending_photo_drops_request() {
        let (mut ws, _) = proposed();
        ws.request_folder_for_photo("/photos/2.jpg", "B").unwrap();
        ws.move_photo("/photos/2.jpg", "B", "C").unwrap();
        assert!(ws.pending().is_none());
    }

    #[test]
    fn test_rename_relinks_in_place() {
        let (mut ws, _) = proposed();
        ws.rename_folder("B", " Beach ").unwrap();
        assert_eq!(folder_names(&ws), vec!["A", "Beach", "C"]);
        assert_eq!(ws.partition().folder("Beach").unwrap().len(), 2);
        assert!(ws.has_unsaved_ai_regeneration());
    }

    #[test]
    fn test_rename_noops_and_rejections() {
        let (mut ws, _) = proposed();
        ws.rename_folder("B", "  ").unwrap();
        ws.rename_folder("B", "B").unwrap();
        assert!(!ws.has_unsaved_ai_regeneration());

        assert_eq!(
            ws.rename_folder("B", "C").unwrap_err(),
            WorkspaceError::FolderExists("C".to_string())
        );
        assert_eq!(
            ws.rename_folder("Z", "Q").unwrap_err(),
            WorkspaceError::FolderNotFound("Z".to_string())
        );
        assert_eq!(folder_names(&ws), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_rename_follows_pending_source() {
        let (mut ws, _) = proposed();
        ws.request_folder_for_photo("/photos/2.jpg", "B").unwrap();
        ws.rename_folder("B", "Renamed").unwrap();
        ws.create_folder_with_pending_photo("Solo").unwrap();
        assert_eq!(ws.partition().folder("Renamed").unwrap().len(), 1);
    }

    #[test]
    fn test_rename_staged_folder() {
        let (mut ws, _) = proposed();
        ws.create_folder("Tmp").unwrap();
        ws.rename_folder("Tmp", "Kept").unwrap();
        assert_eq!(ws.staged_folders(), ["Kept".to_string()]);
    }

    #[test]
    fn test_regenerate_splits_working_set_and_clears_divergence() {
        let (mut ws, photos) = proposed();
        ws.move_photo("/photos/1.jpg", "A", "C").unwrap();
        ws.create_folder("Empty").unwrap();
        assert!(ws.has_unsaved_ai_regeneration());

        ws.regenerate().unwrap();
        assert_eq!(ws.state(), WorkspaceState::Proposed);
        assert!(!ws.has_unsaved_ai_regeneration());
        assert!(ws.staged_folders().is_empty());
        assert_eq!(folder_names(&ws), vec!["AI_Group_1", "AI_Group_2", "AI_Group_3"]);
        // working set order: B(2,3), C(4,5,1)
        let first: Vec<_> = ws
            .partition()
            .folder("AI_Group_1")
            .unwrap()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(first, vec!["2.jpg", "3.jpg"]);
        assert_exact_cover(&photos, ws.partition());
    }

    struct Recording {
        seen: Option<Partition>,
        succeed: bool,
    }

    impl Materializer for Recording {
        type Report = usize;

        fn materialize(&mut self, partition: &Partition) -> (bool, usize) {
            self.seen = Some(partition.clone());
            (self.succeed, partition.photo_count())
        }
    }

    #[test]
    fn test_accept_hands_off_partition_and_finishes() {
        let (mut ws, _) = proposed();
        ws.create_folder("Staged").unwrap();
        let mut materializer = Recording {
            seen: None,
            succeed: true,
        };
        let moved = ws.accept(&mut materializer).unwrap();
        assert_eq!(moved, 5);
        assert_eq!(ws.state(), WorkspaceState::Done);
        assert!(!materializer.seen.unwrap().contains_folder("Staged"));

        assert!(ws.move_photo("/photos/2.jpg", "B", "C").is_err());
    }

    #[test]
    fn test_failed_accept_returns_to_editing() {
        let (mut ws, _) = proposed();
        let mut materializer = Recording {
            seen: None,
            succeed: false,
        };
        ws.accept(&mut materializer).unwrap();
        assert_eq!(ws.state(), WorkspaceState::Editing);
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let (mut ws, _) = proposed();
        ws.move_photo("/photos/1.jpg", "A", "B").unwrap();
        ws.cancel();
        assert_eq!(ws.state(), WorkspaceState::Idle);
        assert!(ws.partition().is_empty());
        assert!(ws.snapshot().session_id.is_none());
        assert!(ws.create_folder("X").is_err());

        ws.propose(StrategyType::Custom, Partition::new()).unwrap();
        assert_eq!(ws.state(), WorkspaceState::Proposed);
    }
}
