//! Generic table state shared by the lists and profiles scopes.
//!
//! Each scope owns its sort state, search filter, selection set, and a
//! row cache replaced wholesale on refresh. The visible view is derived
//! sort-first, filter-second, so filtering never changes the relative
//! order among matches. After any refresh or sort/filter change the
//! selection set is pruned to the ids still visible; stale ids are
//! dropped silently and never resurrected.

use std::cmp::Ordering;
use std::collections::HashSet;

use owbc_core::TableRow;

/// Which column a scope sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Updated,
}

impl SortField {
    /// Direction used when switching onto this field.
    pub fn default_direction(&self) -> SortDirection {
        match self {
            SortField::Name => SortDirection::Asc,
            SortField::Updated => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SortField::Updated,
            direction: SortDirection::Desc,
        }
    }
}

/// Parse a row timestamp. The backend writes RFC3339 with a `Z` suffix;
/// a bare datetime is accepted as a fallback.
fn parse_updated(raw: &str) -> Option<i64> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

fn cmp_ci(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Ascending comparator for the given field. The direction is applied
/// by reversing the composite ordering, which reverses every tie-break
/// step uniformly, so flipping direction reverses the total order
/// exactly.
pub fn compare_rows<R: TableRow>(a: &R, b: &R, sort: SortState) -> Ordering {
    let base = match sort.field {
        SortField::Name => cmp_ci(a.name(), b.name()).then_with(|| cmp_ci(a.id(), b.id())),
        SortField::Updated => match (parse_updated(a.updated_at()), parse_updated(b.updated_at())) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| cmp_ci(a.id(), b.id())),
            // A parseable timestamp sorts ahead of an unparseable one.
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a
                .updated_at()
                .cmp(b.updated_at())
                .then_with(|| cmp_ci(a.id(), b.id())),
        },
    };
    match sort.direction {
        SortDirection::Asc => base,
        SortDirection::Desc => base.reverse(),
    }
}

/// State for one sortable entity scope.
#[derive(Debug, Clone, Default)]
pub struct EntityTable<R> {
    rows: Vec<R>,
    pub sort: SortState,
    filter: String,
    pub selection: HashSet<String>,
    /// Cursor index into the visible row list.
    pub cursor: usize,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl<R: TableRow> EntityTable<R> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            sort: SortState::default(),
            filter: String::new(),
            selection: HashSet::new(),
            cursor: 0,
            loading: false,
            error: None,
            notice: None,
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Replace the row cache wholesale and re-derive selection/cursor.
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.rows = rows;
        self.after_view_change();
    }

    /// Same field flips direction; a new field resets to its default.
    pub fn set_sort(&mut self, field: SortField) {
        if self.sort.field == field {
            self.sort.direction = self.sort.direction.flip();
        } else {
            self.sort = SortState {
                field,
                direction: field.default_direction(),
            };
        }
        self.after_view_change();
    }

    /// Store a trimmed, lower-cased query. Empty means no filtering.
    pub fn set_filter(&mut self, query: &str) {
        self.filter = query.trim().to_lowercase();
        self.after_view_change();
    }

    /// Sorted-then-filtered view of the cached rows.
    pub fn visible(&self) -> Vec<&R> {
        let mut sorted: Vec<&R> = self.rows.iter().collect();
        sorted.sort_by(|a, b| compare_rows(*a, *b, self.sort));
        if self.filter.is_empty() {
            return sorted;
        }
        sorted
            .into_iter()
            .filter(|row| {
                row.id().to_lowercase().contains(&self.filter)
                    || row.name().to_lowercase().contains(&self.filter)
            })
            .collect()
    }

    pub fn visible_ids(&self) -> Vec<String> {
        self.visible().iter().map(|row| row.id().to_string()).collect()
    }

    /// Intersect the selection with the currently visible ids.
    pub fn sync_selection(&mut self) {
        let visible: HashSet<String> = self.visible_ids().into_iter().collect();
        self.selection.retain(|id| visible.contains(id));
    }

    pub fn toggle_selection(&mut self, id: &str) {
        if !self.selection.remove(id) {
            self.selection.insert(id.to_string());
        }
    }

    pub fn select_all_visible(&mut self) {
        for id in self.visible_ids() {
            self.selection.insert(id);
        }
    }

    pub fn deselect_all_visible(&mut self) {
        for id in self.visible_ids() {
            self.selection.remove(&id);
        }
    }

    /// Row id under the cursor, if any.
    pub fn cursor_id(&self) -> Option<String> {
        self.visible().get(self.cursor).map(|row| row.id().to_string())
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.visible().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, len as isize - 1) as usize;
    }

    fn after_view_change(&mut self) {
        self.sync_selection();
        let len = self.visible().len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use owbc_core::PackageList;

    fn row(id: &str, name: &str, updated: &str) -> PackageList {
        PackageList {
            list_id: id.to_string(),
            name: name.to_string(),
            updated_at: updated.to_string(),
            ..Default::default()
        }
    }

    fn table_with(rows: Vec<PackageList>) -> EntityTable<PackageList> {
        let mut table = EntityTable::new();
        table.set_rows(rows);
        table
    }

    fn ids(table: &EntityTable<PackageList>) -> Vec<String> {
        table.visible_ids()
    }

    #[test]
    fn test_default_sort_is_updated_desc() {
        let table: EntityTable<PackageList> = EntityTable::new();
        assert_eq!(table.sort.field, SortField::Updated);
        assert_eq!(table.sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_sort_by_name_case_insensitive_with_id_tiebreak() {
        let mut table = table_with(vec![
            row("b", "Router", "2025-01-01T00:00:00Z"),
            row("a", "router", "2025-01-02T00:00:00Z"),
            row("c", "ap", "2025-01-03T00:00:00Z"),
        ]);
        table.set_sort(SortField::Name);
        assert_eq!(ids(&table), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_name_sort_antisymmetry() {
        let rows = vec![
            row("a", "alpha", "2025-01-01T00:00:00Z"),
            row("b", "Alpha", "2025-01-01T00:00:00Z"),
            row("c", "beta", "x"),
            row("d", "beta", "y"),
        ];
        let mut table = table_with(rows);
        table.set_sort(SortField::Name); // asc
        let ascending = ids(&table);
        table.set_sort(SortField::Name); // flips to desc
        let mut descending = ids(&table);
        descending.reverse();
        assert_eq!(ascending, descending);
    }

    #[test]
    fn test_updated_sort_parseable_ahead_of_unparseable() {
        let mut table = table_with(vec![
            row("u1", "one", "not a date"),
            row("p1", "two", "2025-01-02T00:00:00Z"),
            row("u2", "three", "also not"),
            row("p2", "four", "2025-01-01T00:00:00Z"),
        ]);
        table.sort = SortState {
            field: SortField::Updated,
            direction: SortDirection::Asc,
        };
        // Ascending: parseable first (oldest first), unparseable after,
        // ordered by raw string then id.
        assert_eq!(ids(&table), vec!["p2", "p1", "u2", "u1"]);

        table.sort.direction = SortDirection::Desc;
        assert_eq!(ids(&table), vec!["u1", "u2", "p1", "p2"]);
    }

    #[test]
    fn test_updated_antisymmetry_with_mixed_parseability() {
        let mut table = table_with(vec![
            row("a", "a", "2025-03-01T10:00:00Z"),
            row("b", "b", "garbage"),
            row("c", "c", "2025-02-01T10:00:00Z"),
            row("d", "d", "zzz"),
        ]);
        table.sort = SortState {
            field: SortField::Updated,
            direction: SortDirection::Asc,
        };
        let ascending = ids(&table);
        table.sort.direction = SortDirection::Desc;
        let mut descending = ids(&table);
        descending.reverse();
        assert_eq!(ascending, descending);
    }

    #[test]
    fn test_set_sort_flips_direction_on_same_field() {
        let mut table = table_with(vec![]);
        table.set_sort(SortField::Name);
        assert_eq!(table.sort.direction, SortDirection::Asc);
        table.set_sort(SortField::Name);
        assert_eq!(table.sort.direction, SortDirection::Desc);
        // Switching to updated resets to its default, desc.
        table.set_sort(SortField::Updated);
        assert_eq!(table.sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_filter_matches_id_or_name_case_insensitive() {
        let mut table = table_with(vec![
            row("base-packages", "Base", "2025-01-01T00:00:00Z"),
            row("extras", "LuCI Apps", "2025-01-02T00:00:00Z"),
        ]);
        table.set_filter("  LUCI ");
        assert_eq!(ids(&table), vec!["extras"]);
        table.set_filter("base-p");
        assert_eq!(ids(&table), vec!["base-packages"]);
        table.set_filter("");
        assert_eq!(table.visible().len(), 2);
    }

    #[test]
    fn test_filter_preserves_sorted_order_among_matches() {
        let mut table = table_with(vec![
            row("a", "net-one", "2025-01-03T00:00:00Z"),
            row("b", "net-two", "2025-01-01T00:00:00Z"),
            row("c", "other", "2025-01-02T00:00:00Z"),
        ]);
        // Default updated/desc: a, c, b. Filtering keeps a before b.
        table.set_filter("net");
        assert_eq!(ids(&table), vec!["a", "b"]);
    }

    #[test]
    fn test_selection_pruned_when_filter_hides_rows() {
        let mut table = table_with(vec![
            row("a", "alpha", "2025-01-01T00:00:00Z"),
            row("b", "beta", "2025-01-02T00:00:00Z"),
        ]);
        table.toggle_selection("a");
        assert!(table.selection.contains("a"));

        table.set_filter("z"); // no match
        assert!(table.selection.is_empty());

        // Clearing the filter does not resurrect the selection.
        table.set_filter("");
        assert!(table.selection.is_empty());
    }

    #[test]
    fn test_selection_pruned_on_refresh() {
        let mut table = table_with(vec![row("a", "alpha", ""), row("b", "beta", "")]);
        table.toggle_selection("a");
        table.toggle_selection("b");
        table.set_rows(vec![row("b", "beta", "")]);
        assert_eq!(table.selection.len(), 1);
        assert!(table.selection.contains("b"));
    }

    #[test]
    fn test_select_all_and_deselect_all_visible() {
        let mut table = table_with(vec![
            row("a", "alpha", ""),
            row("b", "beta", ""),
            row("c", "gamma", ""),
        ]);
        table.set_filter("a"); // alpha, beta and gamma all contain "a"
        table.select_all_visible();
        assert_eq!(table.selection.len(), 3);

        table.set_filter("alpha");
        table.deselect_all_visible();
        // Only the visible row was deselected; the rest were pruned by
        // the filter change before that.
        assert!(table.selection.is_empty());
    }

    #[test]
    fn test_cursor_clamps_to_visible() {
        let mut table = table_with(vec![row("a", "alpha", ""), row("b", "beta", "")]);
        table.move_cursor(5);
        assert_eq!(table.cursor, 1);
        table.move_cursor(-5);
        assert_eq!(table.cursor, 0);
        table.set_filter("zzz");
        assert_eq!(table.cursor, 0);
        assert_eq!(table.cursor_id(), None);
    }
}
