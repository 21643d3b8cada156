//! Datasource list carried in the `datasources` announcement property

use std::fmt;

/// Ordered set of connector ids. Iteration follows insertion order and
/// duplicates collapse onto the first occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatasourceSet {
    ids: Vec<String>,
}

impl DatasourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connector id, returning false if it was already present
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for DatasourceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = DatasourceSet::new();
        set.extend(iter);
        set
    }
}

impl<S: Into<String>> Extend<S> for DatasourceSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}

impl fmt::Display for DatasourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

/// Parse a raw property value. Missing values decode to the empty set.
pub fn decode(raw: Option<&str>) -> DatasourceSet {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect()
}

/// Render a set as the comma-joined property value
pub fn encode(set: &DatasourceSet) -> String {
    set.ids.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_trims_dedups_and_drops_empty_tokens() {
        let set = decode(Some("hive, , mysql,hive"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["hive", "mysql"]);
        assert_eq!(encode(&set), "hive,mysql");
    }

    #[test]
    fn test_decode_missing_and_blank() {
        assert!(decode(None).is_empty());
        assert!(decode(Some("")).is_empty());
        assert!(decode(Some(" , ,, ")).is_empty());
    }

    #[test]
    fn test_decode_preserves_first_occurrence_order() {
        let set = decode(Some("tpch,jmx , hive,jmx,tpch,  system"));
        assert_eq!(encode(&set), "tpch,jmx,hive,system");
    }

    #[test]
    fn test_round_trip_is_stable() {
        let inputs = [
            "hive",
            " hive ,mysql,,",
            ",,jmx,,,hive, jmx ,mysql",
            "a,b,c,a,b,c",
        ];
        for input in inputs {
            let once = decode(Some(input));
            let encoded = encode(&once);
            assert!(!encoded.contains(' '));
            assert!(!encoded.contains(",,"));
            assert!(!encoded.ends_with(','));
            assert_eq!(decode(Some(encoded.as_str())), once, "input {:?}", input);
        }
    }

    #[test]
    fn test_encode_empty_set() {
        assert_eq!(encode(&DatasourceSet::new()), "");
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut set = DatasourceSet::new();
        assert!(set.insert("hive"));
        assert!(!set.insert("hive"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.to_string(), "hive");
    }
}
