//! Multi-key ordering for directory listings.
//!
//! A [`SortSpec`] is parsed from the `sort` query parameter, a comma
//! separated list of `name`, `mtime` and `type`, each optionally prefixed
//! with `-` for descending order. The first key is the primary one.
//!
//! Sorting runs one stable single-key pass per key, starting from the last
//! key and ending with the primary. Each pass keeps the relative order of
//! the entries it considers equal, so the result is the lexicographic
//! multi-key order without a combined comparator.

use std::cmp::Ordering;
use std::fmt;

use crate::entry::Entry;
use crate::error::{Error, Result};

/// A field entries can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    /// Case-sensitive byte-wise name order.
    Name,
    /// Modification time, oldest first.
    ModTime,
    /// Directories before everything else. Entries of the same kind tie.
    Type,
}

impl SortField {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "name" => Some(SortField::Name),
            "mtime" => Some(SortField::ModTime),
            "type" => Some(SortField::Type),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::ModTime => "mtime",
            SortField::Type => "type",
        }
    }

    fn compare(self, a: &Entry, b: &Entry) -> Ordering {
        match self {
            SortField::Name => a.name.as_bytes().cmp(b.name.as_bytes()),
            SortField::ModTime => a.mod_time.cmp(&b.mod_time),
            // `true` sorts after `false`, so compare b against a.
            SortField::Type => b.is_dir().cmp(&a.is_dir()),
        }
    }
}

/// One field plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub field: SortField,
    pub ascending: bool,
}

impl SortKey {
    pub fn asc(field: SortField) -> Self {
        Self {
            field,
            ascending: true,
        }
    }

    pub fn desc(field: SortField) -> Self {
        Self {
            field,
            ascending: false,
        }
    }

    /// Parse a single token such as `name` or `-mtime`.
    pub fn parse(token: &str) -> Result<Self> {
        let (name, ascending) = match token.strip_prefix('-') {
            Some(rest) => (rest, false),
            None => (token, true),
        };
        SortField::from_token(name)
            .map(|field| Self { field, ascending })
            .ok_or_else(|| Error::unsupported_sort(token))
    }

    /// Compare two entries under this key. Ties stay ties in both
    /// directions.
    pub fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        let ord = self.field.compare(a, b);
        if self.ascending {
            ord
        } else {
            ord.reverse()
        }
    }

    /// Sort `entries` by this key alone, keeping the order of ties.
    pub fn sort(&self, entries: &mut [Entry]) {
        // slice::sort_by is stable.
        entries.sort_by(|a, b| self.compare(a, b));
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.ascending {
            f.write_str("-")?;
        }
        f.write_str(self.field.as_str())
    }
}

/// Ordered, non-empty list of sort keys, primary first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl Default for SortSpec {
    /// Newest first.
    fn default() -> Self {
        Self {
            keys: vec![SortKey::desc(SortField::ModTime)],
        }
    }
}

impl SortSpec {
    /// Build a spec from explicit keys. Returns `None` for an empty list.
    pub fn new(keys: Vec<SortKey>) -> Option<Self> {
        if keys.is_empty() {
            None
        } else {
            Some(Self { keys })
        }
    }

    /// Parse a query string, falling back to [`SortSpec::default`] when no
    /// token is usable.
    ///
    /// Unsupported tokens are skipped and returned alongside the spec so
    /// the caller can report them; the remaining keys keep their order.
    /// Empty tokens (`name,,mtime`) are ignored.
    pub fn parse(query: &str) -> (Self, Vec<String>) {
        Self::parse_or(query, &Self::default())
    }

    /// Like [`SortSpec::parse`] with a caller-chosen fallback.
    pub fn parse_or(query: &str, fallback: &SortSpec) -> (Self, Vec<String>) {
        let mut keys = Vec::new();
        let mut rejected = Vec::new();

        for token in query.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match SortKey::parse(token) {
                Ok(key) => keys.push(key),
                Err(_) => rejected.push(token.to_string()),
            }
        }

        let spec = Self::new(keys).unwrap_or_else(|| fallback.clone());
        (spec, rejected)
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn primary(&self) -> SortKey {
        self.keys[0]
    }

    /// Reorder `entries`. The set of entries is unchanged.
    pub fn apply(&self, entries: &mut [Entry]) {
        for key in self.keys.iter().rev() {
            key.sort(entries);
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// Sort `entries` by the raw `sort` query value.
///
/// Every recognized key is applied even when some tokens are not; the first
/// unsupported token is then reported as [`Error::UnsupportedSort`]. An
/// empty or entirely unusable query sorts newest first.
pub fn query_sort(entries: &mut [Entry], query: &str) -> Result<()> {
    let (spec, rejected) = SortSpec::parse(query);
    spec.apply(entries);

    match rejected.into_iter().next() {
        Some(token) => Err(Error::unsupported_sort(token)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Kind;
    use chrono::{DateTime, TimeZone, Utc};
    use rand::seq::SliceRandom;
    use rand::Rng;

    fn entry(name: &str, year: i32, kind: Kind) -> Entry {
        Entry {
            name: name.into(),
            path: format!("/{name}"),
            kind,
            size: 0,
            mod_time: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    /// Filesystem order B, A, C, D (files) then F, G, E (directories), with
    /// modification times increasing in that same order.
    fn test_list() -> Vec<Entry> {
        vec![
            entry("B", 2000, Kind::File),
            entry("A", 2001, Kind::File),
            entry("C", 2002, Kind::File),
            entry("D", 2003, Kind::File),
            entry("F", 2004, Kind::Directory),
            entry("G", 2005, Kind::Directory),
            entry("E", 2006, Kind::Directory),
        ]
    }

    fn names(entries: &[Entry]) -> String {
        entries
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn sorted(query: &str) -> (String, Result<()>) {
        let mut list = test_list();
        let result = query_sort(&mut list, query);
        (names(&list), result)
    }

    #[test]
    fn by_name() {
        let (order, result) = sorted("name");
        assert_eq!(order, "A, B, C, D, E, F, G");
        assert!(result.is_ok());

        let (order, _) = sorted("-name");
        assert_eq!(order, "G, F, E, D, C, B, A");
    }

    #[test]
    fn by_mtime() {
        let (order, _) = sorted("mtime");
        assert_eq!(order, "B, A, C, D, F, G, E");

        let (order, _) = sorted("-mtime");
        assert_eq!(order, "E, G, F, D, C, A, B");
    }

    #[test]
    fn empty_query_is_newest_first() {
        let (empty, result) = sorted("");
        let (explicit, _) = sorted("-mtime");
        assert_eq!(empty, explicit);
        assert!(result.is_ok());
    }

    #[test]
    fn type_puts_directories_first_keeping_prior_order() {
        let (order, _) = sorted("type");
        assert_eq!(order, "F, G, E, B, A, C, D");
    }

    #[test]
    fn descending_type_puts_files_first() {
        let (order, _) = sorted("-type");
        assert_eq!(order, "B, A, C, D, F, G, E");
    }

    #[test]
    fn name_then_type_passes() {
        let mut list = test_list();
        SortKey::asc(SortField::Name).sort(&mut list);
        SortKey::asc(SortField::Type).sort(&mut list);
        assert_eq!(names(&list), "E, F, G, A, B, C, D");
    }

    #[test]
    fn type_then_mtime() {
        let (order, result) = sorted("type,mtime");
        assert_eq!(order, "F, G, E, B, A, C, D");
        assert!(result.is_ok());

        let (order, _) = sorted("type,-mtime");
        assert_eq!(order, "E, G, F, D, C, A, B");

        let (order, _) = sorted("type,name");
        assert_eq!(order, "E, F, G, A, B, C, D");
    }

    #[test]
    fn unknown_token_after_known_is_reported() {
        let (order, result) = sorted("mtime,unknown");
        assert_eq!(order, "B, A, C, D, F, G, E");
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "unsupported sorting \"unknown\"");
    }

    #[test]
    fn unknown_token_does_not_stop_later_keys() {
        let (order, result) = sorted("unknown,name");
        assert_eq!(order, "A, B, C, D, E, F, G");
        assert!(matches!(
            result,
            Err(Error::UnsupportedSort { ref token }) if token == "unknown"
        ));

        let (order, result) = sorted("-name,size");
        assert_eq!(order, "G, F, E, D, C, B, A");
        assert!(result.is_err());
    }

    #[test]
    fn only_unknown_tokens_fall_back_to_default() {
        let (order, result) = sorted("size,-owner");
        assert_eq!(order, "E, G, F, D, C, A, B");
        assert!(result.is_err());
    }

    #[test]
    fn parse_reports_every_rejected_token() {
        let (spec, rejected) = SortSpec::parse("type, -bogus ,,name,-");
        assert_eq!(
            spec.keys(),
            &[SortKey::asc(SortField::Type), SortKey::asc(SortField::Name)]
        );
        assert_eq!(rejected, vec!["-bogus".to_string(), "-".to_string()]);
    }

    #[test]
    fn tokens_are_case_sensitive() {
        let (spec, rejected) = SortSpec::parse("Name");
        assert_eq!(spec, SortSpec::default());
        assert_eq!(rejected, vec!["Name".to_string()]);
    }

    #[test]
    fn parse_or_uses_fallback() {
        let fallback = SortSpec::new(vec![SortKey::asc(SortField::Name)]).unwrap();
        let (spec, rejected) = SortSpec::parse_or("", &fallback);
        assert_eq!(spec, fallback);
        assert!(rejected.is_empty());
    }

    #[test]
    fn spec_display_round_trips() {
        let (spec, _) = SortSpec::parse("type,-mtime,name");
        assert_eq!(spec.to_string(), "type,-mtime,name");
        assert_eq!(SortSpec::default().to_string(), "-mtime");
        assert!(SortSpec::new(Vec::new()).is_none());
    }

    #[test]
    fn name_order_is_byte_wise() {
        let mut list = vec![
            entry("b", 2000, Kind::File),
            entry("B", 2000, Kind::File),
            entry("a", 2000, Kind::File),
            entry("Z", 2000, Kind::File),
        ];
        SortKey::asc(SortField::Name).sort(&mut list);
        assert_eq!(names(&list), "B, Z, a, b");
    }

    /// Reverse stable passes must agree with a single lexicographic sort.
    #[test]
    fn multi_pass_matches_lexicographic_sort() {
        let fields = [SortField::Name, SortField::ModTime, SortField::Type];
        let mut rng = rand::thread_rng();

        for _ in 0..200 {
            let len = rng.gen_range(0..24);
            let list: Vec<Entry> = (0..len)
                .map(|i| {
                    // Small value ranges so ties are common.
                    let name = ["a", "b", "c", "A"][rng.gen_range(0..4)];
                    let secs = rng.gen_range(0..4) * 86_400;
                    let kind = if rng.gen_bool(0.4) {
                        Kind::Directory
                    } else {
                        Kind::File
                    };
                    Entry {
                        name: name.into(),
                        path: format!("/{name}{i}"),
                        kind,
                        size: i as u64,
                        mod_time: DateTime::from_timestamp(secs, 0).unwrap(),
                    }
                })
                .collect();

            let key_count = rng.gen_range(1..=3);
            let keys: Vec<SortKey> = (0..key_count)
                .map(|_| SortKey {
                    field: *fields.choose(&mut rng).unwrap(),
                    ascending: rng.gen_bool(0.5),
                })
                .collect();
            let spec = SortSpec::new(keys.clone()).unwrap();

            let mut multi_pass = list.clone();
            spec.apply(&mut multi_pass);

            let mut combined = list.clone();
            combined.sort_by(|a, b| {
                keys.iter()
                    .map(|k| k.compare(a, b))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            });

            assert_eq!(multi_pass, combined, "spec {spec}");
        }
    }
}
