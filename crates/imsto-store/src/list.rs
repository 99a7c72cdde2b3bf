use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page size used when a [`ListSpec`] asks for `limit == 0`.
pub const DEFAULT_LIST_LIMIT: usize = 1000;

/// Enumeration request: prefix filter, exclusive resume marker, page limit
/// and optional delimiter for collapsing keys into common prefixes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSpec {
    pub prefix: Option<String>,
    pub marker: Option<String>,
    pub delimiter: Option<String>,
    pub limit: usize,
    /// Leave `etag` empty; engines then skip reading object bytes.
    #[serde(default)]
    pub keys_only: bool,
}

impl ListSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }

    /// Directory part of the prefix (up to its last `/`), if any.
    ///
    /// Every admitted key lies under it, so hierarchical engines can start
    /// enumeration there instead of at their root.
    pub fn prefix_dir(&self) -> Option<&str> {
        self.prefix
            .as_deref()
            .and_then(|p| p.rfind('/').map(|at| &p[..at]))
            .filter(|dir| !dir.is_empty())
    }

    pub fn effective_limit(&self) -> usize {
        if self.limit == 0 {
            DEFAULT_LIST_LIMIT
        } else {
            self.limit
        }
    }

    /// Whether `key` passes the prefix and marker filters.
    ///
    /// A marker that is a common prefix returned by an earlier page (it ends
    /// with the delimiter) also excludes every key collapsed under it.
    pub fn admits(&self, key: &str) -> bool {
        let prefix = self.prefix.as_deref().unwrap_or("");
        if !key.starts_with(prefix) {
            return false;
        }
        match self.marker.as_deref() {
            None => true,
            Some(m) if self.collapses_under(m) => key > m && !key.starts_with(m),
            Some(m) => key > m,
        }
    }

    fn collapses_under(&self, marker: &str) -> bool {
        let prefix = self.prefix.as_deref().unwrap_or("");
        match self.delimiter.as_deref().filter(|d| !d.is_empty()) {
            Some(d) => marker.len() > prefix.len() && marker.starts_with(prefix) && marker.ends_with(d),
            None => false,
        }
    }

    /// Filter, sort, collapse and truncate `items` for this request.
    ///
    /// Engines gather candidate items however suits their substrate and
    /// hand them here so that every engine pages identically.
    pub fn apply(&self, mut items: Vec<ListItem>) -> Vec<ListItem> {
        items.retain(|item| self.admits(&item.key));
        items.sort_by(|a, b| a.key.cmp(&b.key));

        let limit = self.effective_limit();
        let delimiter = self.delimiter.as_deref().filter(|d| !d.is_empty());
        let prefix_len = self.prefix.as_deref().map_or(0, str::len);

        let mut out: Vec<ListItem> = Vec::new();
        for item in items {
            let common = delimiter.and_then(|d| {
                item.key[prefix_len..]
                    .find(d)
                    .map(|at| item.key[..prefix_len + at + d.len()].to_string())
            });
            match common {
                Some(common) => {
                    if let Some(last) = out.last_mut() {
                        if last.is_prefix && last.key == common {
                            last.last_modified = last.last_modified.max(item.last_modified);
                            continue;
                        }
                    }
                    if out.len() == limit {
                        break;
                    }
                    out.push(ListItem::common_prefix(common, item.last_modified));
                }
                None => {
                    if out.len() == limit {
                        break;
                    }
                    out.push(item);
                }
            }
        }
        out
    }
}

/// One entry of a listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub key: String,
    /// Content tag: MD5 hex of the stored bytes, empty for common prefixes.
    pub etag: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    /// Set when the item stands for keys collapsed under a delimiter.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_prefix: bool,
}

impl ListItem {
    pub fn new(
        key: impl Into<String>,
        etag: impl Into<String>,
        size: u64,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            key: key.into(),
            etag: etag.into(),
            size,
            last_modified,
            is_prefix: false,
        }
    }

    fn common_prefix(key: String, last_modified: DateTime<Utc>) -> Self {
        Self {
            key,
            etag: String::new(),
            size: 0,
            last_modified,
            is_prefix: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(key: &str) -> ListItem {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        ListItem::new(key, "tag", 3, ts)
    }

    fn keys(items: &[ListItem]) -> Vec<&str> {
        items.iter().map(|i| i.key.as_str()).collect()
    }

    fn sample() -> Vec<ListItem> {
        ["zz/00/b", "ab/cd/ef", "ab/cd/eg", "ab/ce/aa", "ac/00/x"]
            .into_iter()
            .map(item)
            .collect()
    }

    #[test]
    fn sorted_lexicographically() {
        let out = ListSpec::new().apply(sample());
        assert_eq!(keys(&out), vec!["ab/cd/ef", "ab/cd/eg", "ab/ce/aa", "ac/00/x", "zz/00/b"]);
    }

    #[test]
    fn prefix_and_marker() {
        let out = ListSpec::new().prefix("ab/").marker("ab/cd/ef").apply(sample());
        assert_eq!(keys(&out), vec!["ab/cd/eg", "ab/ce/aa"]);
    }

    #[test]
    fn limit_and_resume() {
        let spec = ListSpec::new().limit(2);
        let page1 = spec.apply(sample());
        assert_eq!(keys(&page1), vec!["ab/cd/ef", "ab/cd/eg"]);
        let page2 = spec.clone().marker(&page1[1].key).apply(sample());
        assert_eq!(keys(&page2), vec!["ab/ce/aa", "ac/00/x"]);
    }

    #[test]
    fn prefix_dir_is_directory_part() {
        assert_eq!(ListSpec::new().prefix("ab/cd/efgh").prefix_dir(), Some("ab/cd"));
        assert_eq!(ListSpec::new().prefix("ab/").prefix_dir(), Some("ab"));
        assert_eq!(ListSpec::new().prefix("abcd").prefix_dir(), None);
        assert_eq!(ListSpec::new().prefix("/x").prefix_dir(), None);
        assert_eq!(ListSpec::new().prefix_dir(), None);
    }

    #[test]
    fn zero_limit_means_default() {
        assert_eq!(ListSpec::new().effective_limit(), DEFAULT_LIST_LIMIT);
        assert_eq!(ListSpec::new().limit(5).effective_limit(), 5);
    }

    #[test]
    fn delimiter_collapses_common_prefixes() {
        let out = ListSpec::new().delimiter("/").apply(sample());
        assert_eq!(keys(&out), vec!["ab/", "ac/", "zz/"]);
        assert!(out.iter().all(|i| i.is_prefix && i.size == 0 && i.etag.is_empty()));

        let out = ListSpec::new().prefix("ab/").delimiter("/").apply(sample());
        assert_eq!(keys(&out), vec!["ab/cd/", "ab/ce/"]);
    }

    #[test]
    fn delimiter_paging_resumes_after_common_prefix() {
        let all: Vec<ListItem> = ["ab/cd/ef", "ab/cd/eg", "zz/00/b"].into_iter().map(item).collect();
        let mut spec = ListSpec::new().delimiter("/").limit(1);
        let mut seen = Vec::new();
        loop {
            let page = spec.apply(all.clone());
            let Some(last) = page.last() else { break };
            seen.push(last.key.clone());
            assert!(seen.len() <= 3, "paging did not advance: {seen:?}");
            spec = spec.marker(last.key.clone());
        }
        assert_eq!(seen, vec!["ab/", "zz/"]);
    }

    #[test]
    fn common_prefix_marker_under_prefix() {
        let spec = ListSpec::new().prefix("ab/").delimiter("/").marker("ab/cd/");
        let out = spec.apply(sample());
        assert_eq!(keys(&out), vec!["ab/ce/"]);
        // without a delimiter the marker is an ordinary key
        let out = ListSpec::new().prefix("ab/").marker("ab/cd/").apply(sample());
        assert_eq!(keys(&out), vec!["ab/cd/ef", "ab/cd/eg", "ab/ce/aa"]);
    }

    #[test]
    fn delimiter_keeps_leaf_keys() {
        let out = ListSpec::new().prefix("ab/cd/").delimiter("/").apply(sample());
        assert_eq!(keys(&out), vec!["ab/cd/ef", "ab/cd/eg"]);
        assert!(out.iter().all(|i| !i.is_prefix));
    }
}
