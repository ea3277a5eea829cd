use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::photo::PhotoMetadata;

/// Ordered folder name -> photos mapping.
///
/// Folder names are unique by construction (map keys) and both folder order
/// and in-folder order follow insertion. Mutators never leave a folder empty
/// except `insert_folder` with an empty list, which callers use only for
/// staging; `prune_empty` drops those before hand-off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition {
    folders: IndexMap<String, Vec<PhotoMetadata>>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `photo` to `folder`, creating the folder at the end if needed.
    pub fn push(&mut self, folder: impl Into<String>, photo: PhotoMetadata) {
        self.folders.entry(folder.into()).or_default().push(photo);
    }

    /// Inserts a new folder. Returns the photos back if the name is taken.
    pub fn insert_folder(
        &mut self,
        name: impl Into<String>,
        photos: Vec<PhotoMetadata>,
    ) -> Result<(), Vec<PhotoMetadata>> {
        let name = name.into();
        if self.folders.contains_key(&name) {
            return Err(photos);
        }
        self.folders.insert(name, photos);
        Ok(())
    }

    pub fn remove_folder(&mut self, name: &str) -> Option<Vec<PhotoMetadata>> {
        self.folders.shift_remove(name)
    }

    /// Renames in place, keeping the folder's position. Fails if `old` is
    /// missing or `new` is already taken.
    pub fn rename_folder(&mut self, old: &str, new: &str) -> bool {
        if self.folders.contains_key(new) {
            return false;
        }
        let Some(index) = self.folders.get_index_of(old) else {
            return false;
        };
        let Some(photos) = self.folders.shift_remove(old) else {
            return false;
        };
        self.folders.shift_insert(index, new.to_string(), photos);
        true
    }

    /// Removes the photo with `path` from `folder`, dropping the folder if it
    /// ends up empty.
    pub fn take_photo(&mut self, folder: &str, path: &str) -> Option<PhotoMetadata> {
        let photos = self.folders.get_mut(folder)?;
        let index = photos.iter().position(|photo| photo.path == path)?;
        let photo = photos.remove(index);
        if photos.is_empty() {
            self.folders.shift_remove(folder);
        }
        Some(photo)
    }

    pub fn contains_folder(&self, name: &str) -> bool {
        self.folders.contains_key(name)
    }

    pub fn folder(&self, name: &str) -> Option<&[PhotoMetadata]> {
        self.folders.get(name).map(Vec::as_slice)
    }

    pub fn folder_containing(&self, path: &str) -> Option<&str> {
        self.folders
            .iter()
            .find(|(_, photos)| photos.iter().any(|photo| photo.path == path))
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PhotoMetadata])> {
        self.folders
            .iter()
            .map(|(name, photos)| (name.as_str(), photos.as_slice()))
    }

    pub fn folder_names(&self) -> impl Iterator<Item = &str> {
        self.folders.keys().map(String::as_str)
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    pub fn photo_count(&self) -> usize {
        self.folders.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Working set: folder order, then in-folder order.
    pub fn flatten(&self) -> Vec<PhotoMetadata> {
        self.folders.values().flatten().cloned().collect()
    }

    pub fn prune_empty(&mut self) -> usize {
        let before = self.folders.len();
        self.folders.retain(|_, photos| !photos.is_empty());
        before - self.folders.len()
    }
}

impl FromIterator<(String, Vec<PhotoMetadata>)> for Partition {
    /// Folders with the same name are merged in order so no photo is lost.
    fn from_iter<I: IntoIterator<Item = (String, Vec<PhotoMetadata>)>>(iter: I) -> Self {
        let mut partition = Partition::new();
        for (name, photos) in iter {
            partition.folders.entry(name).or_default().extend(photos);
        }
        partition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::photo::test_support::photo;

    fn sample() -> Partition {
        let mut p = Partition::new();
        p.push("a", photo("1.jpg"));
        p.push("b", photo("2.jpg"));
        p.push("a", photo("3.jpg"));
        p.push("c", photo("4.jpg"));
        p
    }

    #[test]
    fn test_push_keeps_insertion_order() {
        let p = sample();
        assert_eq!(p.folder_names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        let names: Vec<_> = p.flatten().into_iter().map(|ph| ph.name).collect();
        assert_eq!(names, vec!["1.jpg", "3.jpg", "2.jpg", "4.jpg"]);
    }

    #[test]
    fn test_take_last_photo_removes_folder() {
        let mut p = sample();
        let taken = p.take_photo("b", "/photos/2.jpg").unwrap();
        assert_eq!(taken.name, "2.jpg");
        assert!(!p.contains_folder("b"));
        assert_eq!(p.photo_count(), 3);
    }

    #[test]
    fn test_take_missing_photo_is_none() {
        let mut p = sample();
        assert!(p.take_photo("b", "/photos/1.jpg").is_none());
        assert!(p.take_photo("zzz", "/photos/1.jpg").is_none());
        assert_eq!(p.photo_count(), 4);
    }

    #[test]
    fn test_rename_keeps_position_and_rejects_taken_names() {
        let mut p = sample();
        assert!(p.rename_folder("b", "beach"));
        assert_eq!(p.folder_names().collect::<Vec<_>>(), vec!["a", "beach", "c"]);
        assert!(!p.rename_folder("a", "c"));
        assert!(!p.rename_folder("missing", "x"));
        assert_eq!(p.folder("a").unwrap().len(), 2);
    }

    #[test]
    fn test_insert_folder_rejects_duplicates() {
        let mut p = sample();
        let rejected = p.insert_folder("a", vec![photo("9.jpg")]).unwrap_err();
        assert_eq!(rejected.len(), 1);
        assert!(p.insert_folder("d", Vec::new()).is_ok());
        assert_eq!(p.prune_empty(), 1);
        assert!(!p.contains_folder("d"));
    }

    #[test]
    fn test_from_iter_merges_same_names() {
        let p: Partition = vec![
            ("x".to_string(), vec![photo("1.jpg")]),
            ("y".to_string(), vec![photo("2.jpg")]),
            ("x".to_string(), vec![photo("3.jpg")]),
        ]
        .into_iter()
        .collect();
        assert_eq!(p.folder_count(), 2);
        assert_eq!(p.folder("x").unwrap().len(), 2);
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let p = sample();
        let json = serde_json::to_value(&p).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        // serde_json without preserve_order sorts keys, so only check membership.
        assert_eq!(keys.len(), 3);
        assert!(json["a"].is_array());
    }
}
