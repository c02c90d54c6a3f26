//! Directory reading shared by the HTML listing and the JSON API.

use ff_core::config::Config;
use ff_core::{Entry, Handle, SortSpec};

/// Listing behaviour fixed at startup.
#[derive(Debug, Clone)]
pub struct ListingOptions {
    /// Used when the request has no usable `sort` token.
    pub default_sort: SortSpec,
    pub show_hidden: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            default_sort: SortSpec::default(),
            show_hidden: true,
        }
    }
}

impl ListingOptions {
    pub fn from_config(config: &Config) -> Self {
        let default_sort = config
            .listing
            .default_sort
            .as_deref()
            .map(|s| SortSpec::parse(s).0)
            .unwrap_or_default();
        Self {
            default_sort,
            show_hidden: config.listing.show_hidden,
        }
    }
}

/// A directory's children in display order.
#[derive(Debug)]
pub struct DirectoryListing {
    pub entries: Vec<Entry>,
    pub sort: SortSpec,
    /// Sort tokens that were skipped, in query order.
    pub rejected: Vec<String>,
}

/// Read every child of the directory at `path` and order them.
///
/// A read failure fails the whole listing; no partial list is returned.
pub async fn read_listing(
    handle: &mut dyn Handle,
    path: &str,
    sort_query: Option<&str>,
    options: &ListingOptions,
) -> ff_core::Result<DirectoryListing> {
    let children = handle.read_dir(0).await?;

    let mut entries: Vec<Entry> = children
        .into_iter()
        .map(|stat| Entry::from_stat(path, stat))
        .filter(|entry| options.show_hidden || !entry.is_hidden())
        .collect();

    let (sort, rejected) = SortSpec::parse_or(sort_query.unwrap_or(""), &options.default_sort);
    for token in &rejected {
        tracing::warn!(path, token = %token, "Ignoring unsupported sort token");
    }
    sort.apply(&mut entries);

    Ok(DirectoryListing {
        entries,
        sort,
        rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ff_core::{FileSystem, MemoryFs, SortField, SortKey};

    fn fs() -> MemoryFs {
        let at = |s| Utc.timestamp_opt(s, 0).unwrap();
        MemoryFs::new()
            .with_file_at("/d/b.txt", "b", at(300))
            .with_file_at("/d/.hidden", "h", at(400))
            .with_file_at("/d/a.txt", "a", at(100))
            .with_dir_at("/d/sub", at(200))
    }

    fn names(listing: &DirectoryListing) -> Vec<&str> {
        listing.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[tokio::test]
    async fn default_is_newest_first_with_dotfiles() {
        let fs = fs();
        let mut handle = fs.open("/d").await.unwrap();
        let listing = read_listing(handle.as_mut(), "/d", None, &ListingOptions::default())
            .await
            .unwrap();
        assert_eq!(names(&listing), vec![".hidden", "b.txt", "sub", "a.txt"]);
        assert_eq!(listing.entries[1].path, "/d/b.txt");
        assert!(listing.rejected.is_empty());
    }

    #[tokio::test]
    async fn default_config_lists_dotfiles() {
        let fs = MemoryFs::new()
            .with_file("/d/.env", "KEY=1")
            .with_file("/d/a.txt", "a");
        let mut handle = fs.open("/d").await.unwrap();
        let options = ListingOptions::from_config(&Config::default());
        let listing = read_listing(handle.as_mut(), "/d", Some("name"), &options)
            .await
            .unwrap();
        assert_eq!(names(&listing), vec![".env", "a.txt"]);
    }

    #[tokio::test]
    async fn dotfiles_dropped_when_disabled() {
        let fs = fs();
        let mut handle = fs.open("/d").await.unwrap();
        let options = ListingOptions {
            show_hidden: false,
            ..ListingOptions::default()
        };
        let listing = read_listing(handle.as_mut(), "/d", None, &options)
            .await
            .unwrap();
        assert_eq!(names(&listing), vec!["b.txt", "sub", "a.txt"]);
    }

    #[tokio::test]
    async fn query_sort_and_rejects() {
        let fs = fs();
        let mut handle = fs.open("/d").await.unwrap();
        let listing = read_listing(
            handle.as_mut(),
            "/d",
            Some("type,bogus,name"),
            &ListingOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(names(&listing), vec!["sub", ".hidden", "a.txt", "b.txt"]);
        assert_eq!(listing.rejected, vec!["bogus"]);
    }

    #[tokio::test]
    async fn configured_default_sort() {
        let fs = fs();
        let mut handle = fs.open("/d").await.unwrap();
        let options = ListingOptions {
            default_sort: SortSpec::new(vec![SortKey::asc(SortField::Name)]).unwrap(),
            ..ListingOptions::default()
        };
        let listing = read_listing(handle.as_mut(), "/d", Some(""), &options)
            .await
            .unwrap();
        assert_eq!(names(&listing), vec![".hidden", "a.txt", "b.txt", "sub"]);
    }

    #[test]
    fn options_from_config() {
        let mut config = Config::default();
        config.listing.default_sort = Some("name,zzz".into());
        let options = ListingOptions::from_config(&config);
        assert_eq!(options.default_sort.to_string(), "name");
        assert!(options.show_hidden);
    }
}
