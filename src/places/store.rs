// Place store — deduplicated collection of place records.
//
// Places are kept in insertion order so every downstream pass (indexing,
// tiling, template export) walks the corpus deterministically. Identity is
// the id alone; a second record with a known id is dropped.

use std::collections::HashMap;

use super::models::{BoundingBox, Place, PlaceId};

#[derive(Debug, Default)]
pub struct PlaceStore {
    places: Vec<Place>,
    by_id: HashMap<PlaceId, usize>,
    by_title: HashMap<String, Vec<PlaceId>>,
    bounds: Option<BoundingBox>,
    /// Next id handed out to placeholder places, always above every known id
    next_id: PlaceId,
}

impl PlaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an iterator of places, dropping duplicate ids.
    pub fn from_places(places: impl IntoIterator<Item = Place>) -> Self {
        let mut store = Self::new();
        for place in places {
            store.insert(place);
        }
        store
    }

    /// Insert a place. Returns false (and keeps the first record) if the id
    /// is already present.
    pub fn insert(&mut self, place: Place) -> bool {
        if self.by_id.contains_key(&place.id) {
            return false;
        }

        if let Some(point) = place.location {
            match self.bounds.as_mut() {
                Some(bounds) => bounds.extend(point),
                None => self.bounds = Some(BoundingBox::around(point)),
            }
        }

        self.next_id = self.next_id.max(place.id.saturating_add(1));
        self.by_title
            .entry(place.title.clone())
            .or_default()
            .push(place.id);
        self.by_id.insert(place.id, self.places.len());
        self.places.push(place);
        true
    }

    /// Ensure a place titled `title` exists, creating a bare placeholder
    /// (no location, no city) if none does. Returns the ids of every place
    /// carrying that exact title, oldest first.
    pub fn add_placeholder(&mut self, title: &str) -> Vec<PlaceId> {
        if !self.by_title.contains_key(title) {
            let id = self.next_id;
            self.insert(Place::new(id, title));
        }
        self.by_title.get(title).cloned().unwrap_or_default()
    }

    pub fn get(&self, id: PlaceId) -> Option<&Place> {
        self.by_id.get(&id).map(|&i| &self.places[i])
    }

    pub fn contains(&self, id: PlaceId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// All places with exactly this title, in insertion order.
    pub fn get_by_title(&self, title: &str) -> Vec<&Place> {
        self.by_title
            .get(title)
            .map(|ids| ids.iter().filter_map(|&id| self.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Place> {
        self.places.iter()
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Bounding box over geolocated places, `None` if no place has a location.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }
}
