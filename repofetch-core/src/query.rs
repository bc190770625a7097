//! Filtering, sorting and pagination over merged repositories.
//!
//! Query parameters arrive as raw strings and are normalised once into a
//! [`RepoQuery`]. Parsing never fails: out-of-range or unparsable values fall
//! back to their defaults or are clamped, so a listing request cannot be
//! rejected for its paging parameters.

use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;

use crate::model::MergedView;

pub const DEFAULT_SORT_FIELD: &str = "stargazers_count";
pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PER_PAGE: usize = 50;
pub const MAX_PER_PAGE: usize = 100;

/// Raw query-string parameters of `GET /api/repos`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoQueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// `asc` (any case) is ascending; anything else is descending.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Field of a merged repository that listings can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Name,
    FullName,
    Description,
    Private,
    HtmlUrl,
    CloneUrl,
    SshUrl,
    Url,
    Language,
    StargazersCount,
    ForksCount,
    OpenIssuesCount,
    Size,
    CreatedAt,
    UpdatedAt,
    PushedAt,
    DefaultBranch,
    IsAiProject,
    TaggedAi,
    NameMatchesAi,
    Priority,
    Highlighted,
    /// Name that matches no field. Every repository compares as `0`, so the
    /// listing keeps its input order.
    Unknown,
}

impl SortField {
    pub fn parse(name: &str) -> Self {
        match name {
            "id" => SortField::Id,
            "name" => SortField::Name,
            "full_name" => SortField::FullName,
            "description" => SortField::Description,
            "private" => SortField::Private,
            "html_url" => SortField::HtmlUrl,
            "clone_url" => SortField::CloneUrl,
            "ssh_url" => SortField::SshUrl,
            "url" => SortField::Url,
            "language" => SortField::Language,
            "stargazers_count" => SortField::StargazersCount,
            "forks_count" => SortField::ForksCount,
            "open_issues_count" => SortField::OpenIssuesCount,
            "size" => SortField::Size,
            "created_at" => SortField::CreatedAt,
            "updated_at" => SortField::UpdatedAt,
            "pushed_at" => SortField::PushedAt,
            "default_branch" => SortField::DefaultBranch,
            "is_ai_project" => SortField::IsAiProject,
            "tagged_ai" => SortField::TaggedAi,
            "name_matches_ai" => SortField::NameMatchesAi,
            "priority" => SortField::Priority,
            "highlighted" => SortField::Highlighted,
            _ => SortField::Unknown,
        }
    }

    fn value(self, view: &MergedView) -> SortValue<'_> {
        let repo = &view.repository;
        match self {
            SortField::Id => SortValue::number(repo.id),
            SortField::Name => SortValue::Text(&repo.name),
            SortField::FullName => SortValue::Text(&repo.full_name),
            SortField::Description => SortValue::optional_text(repo.description.as_deref()),
            SortField::Private => SortValue::flag(repo.private),
            SortField::HtmlUrl => SortValue::Text(&repo.html_url),
            SortField::CloneUrl => SortValue::Text(&repo.clone_url),
            SortField::SshUrl => SortValue::Text(&repo.ssh_url),
            SortField::Url => SortValue::Text(&repo.url),
            SortField::Language => SortValue::optional_text(repo.language.as_deref()),
            SortField::StargazersCount => SortValue::number(repo.stargazers_count),
            SortField::ForksCount => SortValue::number(repo.forks_count),
            SortField::OpenIssuesCount => SortValue::number(repo.open_issues_count),
            SortField::Size => SortValue::number(repo.size),
            SortField::CreatedAt => SortValue::optional_text(repo.created_at.as_deref()),
            SortField::UpdatedAt => SortValue::optional_text(repo.updated_at.as_deref()),
            SortField::PushedAt => SortValue::optional_text(repo.pushed_at.as_deref()),
            SortField::DefaultBranch => SortValue::Text(&repo.default_branch),
            SortField::IsAiProject => SortValue::flag(view.is_ai_project),
            SortField::TaggedAi => SortValue::flag(view.tagged_ai),
            SortField::NameMatchesAi => SortValue::flag(view.name_matches_ai),
            SortField::Priority => SortValue::Number(i128::from(view.metadata.priority)),
            SortField::Highlighted => SortValue::flag(view.metadata.highlighted),
            SortField::Unknown => SortValue::Number(0),
        }
    }
}

/// Comparable projection of a field. Missing values are `Number(0)`.
///
/// Numbers order before text, which keeps the ordering total when a text
/// field is missing on some repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue<'a> {
    Number(i128),
    Text(&'a str),
}

impl<'a> SortValue<'a> {
    fn number(n: u64) -> Self {
        SortValue::Number(i128::from(n))
    }

    fn flag(b: bool) -> Self {
        SortValue::Number(i128::from(b))
    }

    fn optional_text(value: Option<&'a str>) -> Self {
        value.map_or(SortValue::Number(0), SortValue::Text)
    }
}

/// Normalised listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoQuery {
    pub q: Option<String>,
    pub tag: Option<String>,
    pub language: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
    pub page: usize,
    pub per_page: usize,
}

impl Default for RepoQuery {
    fn default() -> Self {
        Self {
            q: None,
            tag: None,
            language: None,
            sort: SortField::parse(DEFAULT_SORT_FIELD),
            order: SortOrder::Desc,
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl RepoQuery {
    /// Normalise raw parameters. Empty strings count as absent.
    pub fn from_params(params: &RepoQueryParams) -> Self {
        Self {
            q: non_empty(&params.q),
            tag: non_empty(&params.tag),
            language: non_empty(&params.language),
            sort: non_empty(&params.sort)
                .map(|s| SortField::parse(&s))
                .unwrap_or_else(|| SortField::parse(DEFAULT_SORT_FIELD)),
            order: non_empty(&params.order)
                .map(|o| SortOrder::parse(&o))
                .unwrap_or_default(),
            page: parse_page(params.page.as_deref()),
            per_page: parse_per_page(params.per_page.as_deref()),
        }
    }

    /// Whether `view` passes every supplied filter.
    pub fn matches(&self, view: &MergedView) -> bool {
        if let Some(q) = &self.q {
            let needle = q.to_lowercase();
            let in_name = view.repository.name.to_lowercase().contains(&needle);
            let in_description = view
                .repository
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_name && !in_description {
                return false;
            }
        }

        if let Some(tag) = &self.tag {
            if !view.metadata.has_tag(tag) {
                return false;
            }
        }

        if let Some(language) = &self.language {
            let matches_language = view
                .repository
                .language
                .as_deref()
                .is_some_and(|l| l.to_lowercase() == language.to_lowercase());
            if !matches_language {
                return false;
            }
        }

        true
    }

    /// Half-open index window `[start, end)` for the current page.
    pub fn window(&self) -> (usize, usize) {
        let start = self.page.saturating_sub(1).saturating_mul(self.per_page);
        (start, start.saturating_add(self.per_page))
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Parse an integer parameter. Digit strings too large for the target
/// saturate instead of counting as unparsable.
fn parse_saturating(value: &str) -> Option<i128> {
    match value.trim().parse::<i128>() {
        Ok(n) => Some(n),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(i128::MAX),
            IntErrorKind::NegOverflow => Some(i128::MIN),
            _ => None,
        },
    }
}

fn parse_page(value: Option<&str>) -> usize {
    match value.and_then(parse_saturating) {
        Some(page) if page >= 1 => usize::try_from(page).unwrap_or(usize::MAX),
        Some(_) => 1,
        None => DEFAULT_PAGE,
    }
}

fn parse_per_page(value: Option<&str>) -> usize {
    match value.and_then(parse_saturating) {
        Some(per_page) => per_page.clamp(1, MAX_PER_PAGE as i128) as usize,
        None => DEFAULT_PER_PAGE,
    }
}

/// Listing response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoPage {
    /// Number of merged repositories before filtering.
    pub total: usize,
    /// Number of repositories that passed the filters.
    pub filtered: usize,
    pub page: usize,
    pub per_page: usize,
    pub repos: Vec<MergedView>,
}

pub fn filter_repositories(repos: Vec<MergedView>, query: &RepoQuery) -> Vec<MergedView> {
    repos.into_iter().filter(|r| query.matches(r)).collect()
}

/// Stable sort: repositories with equal keys keep their relative order.
pub fn sort_repositories(repos: &mut [MergedView], field: SortField, order: SortOrder) {
    repos.sort_by(|a, b| {
        let ordering = field.value(a).cmp(&field.value(b));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

pub fn paginate(repos: Vec<MergedView>, query: &RepoQuery) -> Vec<MergedView> {
    let (start, end) = query.window();
    if start >= repos.len() {
        return Vec::new();
    }
    let end = end.min(repos.len());
    repos.into_iter().skip(start).take(end - start).collect()
}

/// Filter, sort and slice `merged` into one page of results.
pub fn run_query(merged: Vec<MergedView>, query: &RepoQuery) -> RepoPage {
    let total = merged.len();
    let mut filtered = filter_repositories(merged, query);
    let filtered_count = filtered.len();
    sort_repositories(&mut filtered, query.sort, query.order);

    RepoPage {
        total,
        filtered: filtered_count,
        page: query.page,
        per_page: query.per_page,
        repos: paginate(filtered, query),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MetadataRecord, RepositorySummary};
    use proptest::prelude::*;
    use serde_json::json;

    fn view(name: &str, stars: u64) -> MergedView {
        let repo: RepositorySummary = serde_json::from_value(json!({
            "id": stars,
            "name": name,
            "full_name": format!("org/{}", name),
            "stargazers_count": stars,
        }))
        .unwrap();
        MergedView::new(repo, MetadataRecord::default())
    }

    fn view_with(
        name: &str,
        description: Option<&str>,
        language: Option<&str>,
        tags: &[&str],
    ) -> MergedView {
        let mut v = view(name, 0);
        v.repository.description = description.map(str::to_string);
        v.repository.language = language.map(str::to_string);
        MergedView::new(
            v.repository,
            MetadataRecord {
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..MetadataRecord::default()
            },
        )
    }

    fn names(repos: &[MergedView]) -> Vec<&str> {
        repos.iter().map(|r| r.repository.name.as_str()).collect()
    }

    fn params(pairs: &[(&str, &str)]) -> RepoQueryParams {
        let map: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    #[test]
    fn test_defaults() {
        let query = RepoQuery::from_params(&RepoQueryParams::default());
        assert_eq!(query, RepoQuery::default());
        assert_eq!(query.sort, SortField::StargazersCount);
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!((query.page, query.per_page), (1, 50));
    }

    #[test]
    fn test_sort_by_stars_desc() {
        let query = RepoQuery::from_params(&params(&[
            ("sort", "stargazers_count"),
            ("order", "desc"),
        ]));
        let page = run_query(vec![view("x", 5), view("y", 10)], &query);
        assert_eq!(names(&page.repos), vec!["y", "x"]);
    }

    #[test]
    fn test_sort_by_stars_asc() {
        let query = RepoQuery::from_params(&params(&[("order", "ASC")]));
        let page = run_query(vec![view("y", 10), view("x", 5)], &query);
        assert_eq!(names(&page.repos), vec!["x", "y"]);
    }

    #[test]
    fn test_unrecognised_order_is_desc() {
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::Asc.as_str(), "asc");
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let input = vec![view("first", 3), view("second", 3), view("third", 1)];

        let desc = run_query(input.clone(), &RepoQuery::default());
        assert_eq!(names(&desc.repos), vec!["first", "second", "third"]);

        let asc = run_query(
            input,
            &RepoQuery {
                order: SortOrder::Asc,
                ..RepoQuery::default()
            },
        );
        assert_eq!(names(&asc.repos), vec!["third", "first", "second"]);
    }

    #[test]
    fn test_unknown_sort_field_keeps_input_order() {
        let query = RepoQuery::from_params(&params(&[("sort", "nonexistent")]));
        let page = run_query(vec![view("b", 1), view("a", 9), view("c", 4)], &query);
        assert_eq!(names(&page.repos), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_sort_by_text_with_missing_values_first_in_asc() {
        let repos = vec![
            view_with("rust", None, Some("Rust"), &[]),
            view_with("none", None, None, &[]),
            view_with("go", None, Some("Go"), &[]),
        ];
        let query = RepoQuery {
            sort: SortField::Language,
            order: SortOrder::Asc,
            ..RepoQuery::default()
        };
        let page = run_query(repos, &query);
        assert_eq!(names(&page.repos), vec!["none", "go", "rust"]);
    }

    #[test]
    fn test_sort_by_priority_and_highlighted() {
        let mut low = view("low", 0);
        low.metadata.priority = -1;
        let mut high = view("high", 0);
        high.metadata.priority = 7;
        high.metadata.highlighted = true;
        let plain = view("plain", 0);

        let by_priority = run_query(
            vec![low.clone(), plain.clone(), high.clone()],
            &RepoQuery {
                sort: SortField::Priority,
                ..RepoQuery::default()
            },
        );
        assert_eq!(names(&by_priority.repos), vec!["high", "plain", "low"]);

        let by_highlight = run_query(
            vec![low, plain, high],
            &RepoQuery {
                sort: SortField::Highlighted,
                ..RepoQuery::default()
            },
        );
        assert_eq!(names(&by_highlight.repos), vec!["high", "low", "plain"]);
    }

    #[test]
    fn test_text_filter_matches_name() {
        let query = RepoQuery::from_params(&params(&[("q", "ai")]));
        let page = run_query(vec![view("my-ai-tool", 0), view("other", 0)], &query);
        assert_eq!(names(&page.repos), vec!["my-ai-tool"]);
        assert_eq!((page.total, page.filtered), (2, 1));
    }

    #[test]
    fn test_text_filter_matches_description_case_insensitively() {
        let repos = vec![
            view_with("alpha", Some("A Machine LEARNING toolkit"), None, &[]),
            view_with("beta", None, None, &[]),
            view_with("gamma", Some("unrelated"), None, &[]),
        ];
        let query = RepoQuery::from_params(&params(&[("q", "learning")]));
        let page = run_query(repos, &query);
        assert_eq!(names(&page.repos), vec!["alpha"]);
    }

    #[test]
    fn test_empty_filters_are_ignored() {
        let query = RepoQuery::from_params(&params(&[("q", ""), ("tag", ""), ("language", "")]));
        assert_eq!(query.q, None);
        assert_eq!(query.tag, None);
        assert_eq!(query.language, None);
    }

    #[test]
    fn test_tag_filter_is_exact() {
        let repos = vec![
            view_with("a", None, None, &["ai", "cli"]),
            view_with("b", None, None, &["AI"]),
            view_with("c", None, None, &[]),
        ];
        let query = RepoQuery::from_params(&params(&[("tag", "ai")]));
        let page = run_query(repos, &query);
        assert_eq!(names(&page.repos), vec!["a"]);
    }

    #[test]
    fn test_language_filter_is_case_insensitive_exact() {
        let repos = vec![
            view_with("a", None, Some("TypeScript"), &[]),
            view_with("b", None, Some("Type"), &[]),
            view_with("c", None, None, &[]),
        ];
        let query = RepoQuery::from_params(&params(&[("language", "typescript")]));
        let page = run_query(repos, &query);
        assert_eq!(names(&page.repos), vec!["a"]);
    }

    #[test]
    fn test_filters_compose_conjunctively() {
        let repos = vec![
            view_with("ai-rust", None, Some("Rust"), &["ai"]),
            view_with("ai-go", None, Some("Go"), &["ai"]),
            view_with("ml-rust", None, Some("Rust"), &["ai"]),
            view_with("ai-untagged", None, Some("Rust"), &[]),
        ];
        let query =
            RepoQuery::from_params(&params(&[("q", "ai"), ("tag", "ai"), ("language", "rust")]));
        let page = run_query(repos, &query);
        assert_eq!(names(&page.repos), vec!["ai-rust"]);
    }

    #[test]
    fn test_empty_input_first_page() {
        let page = run_query(vec![], &RepoQuery::default());
        assert_eq!(page.total, 0);
        assert_eq!(page.filtered, 0);
        assert_eq!((page.page, page.per_page), (1, 50));
        assert!(page.repos.is_empty());
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let repos: Vec<MergedView> = (0..5).map(|i| view(&format!("r{}", i), i)).collect();
        let query = RepoQuery::from_params(&params(&[("page", "3"), ("per_page", "2")]));
        let page = run_query(repos.clone(), &query);
        assert_eq!(names(&page.repos), vec!["r0"]);

        let query = RepoQuery::from_params(&params(&[("page", "4"), ("per_page", "2")]));
        let page = run_query(repos, &query);
        assert!(page.repos.is_empty());
        assert_eq!(page.filtered, 5);
        assert_eq!(page.page, 4);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let query = RepoQuery::from_params(&params(&[
            ("page", "9223372036854775807"),
            ("per_page", "100"),
        ]));
        let page = run_query(vec![view("a", 1)], &query);
        assert!(page.repos.is_empty());
    }

    #[test]
    fn test_per_page_is_clamped() {
        let query = RepoQuery::from_params(&params(&[("per_page", "500")]));
        assert_eq!(query.per_page, 100);
        let query = RepoQuery::from_params(&params(&[("per_page", "0")]));
        assert_eq!(query.per_page, 1);
        let query = RepoQuery::from_params(&params(&[("per_page", "-3")]));
        assert_eq!(query.per_page, 1);
        let query = RepoQuery::from_params(&params(&[("per_page", "lots")]));
        assert_eq!(query.per_page, 50);
        let query = RepoQuery::from_params(&params(&[("per_page", "100000000000000000000")]));
        assert_eq!(query.per_page, 100);
        let query =
            RepoQuery::from_params(&params(&[("per_page", "-100000000000000000000000000000000000000000")]));
        assert_eq!(query.per_page, 1);
    }

    #[test]
    fn test_page_below_one_is_first_page() {
        let query = RepoQuery::from_params(&params(&[("page", "0")]));
        assert_eq!(query.page, 1);
        let query = RepoQuery::from_params(&params(&[("page", "-2")]));
        assert_eq!(query.page, 1);
        let query = RepoQuery::from_params(&params(&[("page", "second")]));
        assert_eq!(query.page, 1);
        let query =
            RepoQuery::from_params(&params(&[("page", "-100000000000000000000000000000000000000000")]));
        assert_eq!(query.page, 1);
    }

    #[test]
    fn test_huge_page_saturates_past_the_end() {
        let query = RepoQuery::from_params(&params(&[("page", "100000000000000000000000000000000000000000")]));
        assert_eq!(query.page, usize::MAX);

        let views = vec![view("a", 1)];
        let page = run_query(views, &query);
        assert_eq!(page.filtered, 1);
        assert!(page.repos.is_empty());
    }

    #[test]
    fn test_second_page_window() {
        let query = RepoQuery {
            page: 2,
            per_page: 50,
            ..RepoQuery::default()
        };
        assert_eq!(query.window(), (50, 100));
    }

    fn arb_view() -> impl Strategy<Value = MergedView> {
        (
            "[a-z]{1,6}",
            proptest::option::of("[a-zA-Z ]{0,12}"),
            proptest::option::of(prop_oneof![Just("Rust"), Just("Go"), Just("rust")]),
            proptest::collection::vec(prop_oneof![Just("ai"), Just("cli"), Just("web")], 0..3),
            0u64..20,
        )
            .prop_map(|(name, description, language, tags, stars)| {
                let mut v = view(&name, stars);
                v.repository.description = description;
                v.repository.language = language.map(str::to_string);
                MergedView::new(
                    v.repository,
                    MetadataRecord {
                        tags: tags.into_iter().map(str::to_string).collect(),
                        ..MetadataRecord::default()
                    },
                )
            })
    }

    proptest! {
        /// Property: every returned repository satisfies every supplied filter,
        /// and the filtered count never exceeds the total.
        #[test]
        fn filters_are_conjunctive(
            repos in proptest::collection::vec(arb_view(), 0..30),
            q in proptest::option::of("[a-z]{1,2}"),
            tag in proptest::option::of(prop_oneof![Just("ai".to_string()), Just("cli".to_string())]),
            language in proptest::option::of(prop_oneof![Just("RUST".to_string()), Just("go".to_string())]),
        ) {
            let query = RepoQuery { q: q.clone(), tag: tag.clone(), language: language.clone(), per_page: MAX_PER_PAGE, ..RepoQuery::default() };
            let page = run_query(repos.clone(), &query);

            prop_assert!(page.filtered <= page.total);
            prop_assert_eq!(page.total, repos.len());
            for r in &page.repos {
                if let Some(q) = &q {
                    let in_name = r.repository.name.to_lowercase().contains(q.as_str());
                    let in_desc = r.repository.description.as_deref().is_some_and(|d| d.to_lowercase().contains(q.as_str()));
                    prop_assert!(in_name || in_desc);
                }
                if let Some(tag) = &tag {
                    prop_assert!(r.metadata.tags.contains(tag));
                }
                if let Some(language) = &language {
                    prop_assert!(r.repository.language.as_deref().is_some_and(|l| l.eq_ignore_ascii_case(language)));
                }
            }
        }

        /// Property: equal sort keys keep their merge order in both directions.
        #[test]
        fn sort_is_stable(repos in proptest::collection::vec(arb_view(), 0..30), asc in any::<bool>()) {
            let indexed: Vec<MergedView> = repos
                .into_iter()
                .enumerate()
                .map(|(i, mut v)| { v.repository.id = i as u64; v })
                .collect();
            let mut sorted = indexed.clone();
            let order = if asc { SortOrder::Asc } else { SortOrder::Desc };
            sort_repositories(&mut sorted, SortField::StargazersCount, order);

            for pair in sorted.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if a.repository.stargazers_count == b.repository.stargazers_count {
                    prop_assert!(a.repository.id < b.repository.id);
                } else if asc {
                    prop_assert!(a.repository.stargazers_count < b.repository.stargazers_count);
                } else {
                    prop_assert!(a.repository.stargazers_count > b.repository.stargazers_count);
                }
            }
        }

        /// Property: pages partition the filtered list.
        #[test]
        fn pages_partition_results(repos in proptest::collection::vec(arb_view(), 0..40), per_page in 1usize..10) {
            let mut collected = Vec::new();
            let mut page_number = 1;
            loop {
                let query = RepoQuery { page: page_number, per_page, ..RepoQuery::default() };
                let page = run_query(repos.clone(), &query);
                prop_assert!(page.repos.len() <= per_page);
                if page.repos.is_empty() {
                    break;
                }
                collected.extend(page.repos);
                page_number += 1;
            }
            prop_assert_eq!(collected.len(), repos.len());
        }
    }
}
