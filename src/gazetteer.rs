use crate::geo::Coordinate;

/// Bangalore localities the case dataset refers to by name.
const LOCALITIES: &[(&str, Coordinate)] = &[
    ("Indiranagar", Coordinate::new(12.9716, 77.6412)),
    ("Whitefield", Coordinate::new(12.9698, 77.7500)),
    ("Koramangala", Coordinate::new(12.9352, 77.6245)),
    ("Jayanagar", Coordinate::new(12.9250, 77.5938)),
    ("Malleshwaram", Coordinate::new(13.0051, 77.5707)),
    ("Hebbal", Coordinate::new(13.0359, 77.5970)),
    ("Electronic City", Coordinate::new(12.8391, 77.6793)),
    ("BTM Layout", Coordinate::new(12.9165, 77.6101)),
    ("Rajajinagar", Coordinate::new(12.9913, 77.5560)),
    ("Marathahalli", Coordinate::new(12.9563, 77.7010)),
    ("Bannerghatta", Coordinate::new(12.8000, 77.5770)),
    ("Yeshwanthpur", Coordinate::new(13.0282, 77.5404)),
];

/// Fixed locality name -> coordinate lookup.
#[derive(Debug, Clone, Copy)]
pub struct Gazetteer {
    entries: &'static [(&'static str, Coordinate)],
}

impl Default for Gazetteer {
    fn default() -> Self {
        Self::bangalore()
    }
}

impl Gazetteer {
    pub const fn bangalore() -> Self {
        Self {
            entries: LOCALITIES,
        }
    }

    /// Exact, case-sensitive match on the trimmed name.
    pub fn lookup(&self, name: &str) -> Option<Coordinate> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| *c)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
