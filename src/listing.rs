//! Client-side filtering and pagination over a loaded collection.
//!
//! A [`ListView`] owns the full collection, a filter and a page cursor. The
//! filtered view is re-derived synchronously on every change; any change to
//! the filter or the collection puts the cursor back on page 1.

use crate::models::{ActivityGroup, ActivityId, ActivityRecord, RosterEntry, RosterRow, Status};

pub const PAGE_SIZE: usize = 5;

/// A filter that is either off (`All`) or an exact-match value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice<T> {
    All,
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: PartialEq + Clone> Choice<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }

    /// Step through `All`, then each option in order, then back to `All`.
    pub fn cycle(&self, options: &[T]) -> Self {
        let next = match self {
            Self::All => 0,
            Self::Only(current) => match options.iter().position(|o| o == current) {
                Some(i) => i + 1,
                None => 0,
            },
        };
        options
            .get(next)
            .cloned()
            .map_or(Self::All, Self::Only)
    }
}

impl<T: std::fmt::Display> Choice<T> {
    pub fn label(&self) -> String {
        match self {
            Self::All => "all".into(),
            Self::Only(v) => v.to_string(),
        }
    }
}

pub trait Filter<T> {
    fn matches(&self, item: &T) -> bool;
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

// ─── Activity filter ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub search: String,
    pub subject: Choice<String>,
    pub status: Choice<Status>,
}

impl Filter<ActivityRecord> for FilterState {
    fn matches(&self, r: &ActivityRecord) -> bool {
        let needle = self.search.to_lowercase();
        let search_ok = needle.is_empty()
            || contains_ci(&r.title, &needle)
            || contains_ci(&r.subject, &needle)
            || contains_ci(&r.description, &needle);
        search_ok && self.subject.admits(&r.subject) && self.status.admits(&r.status)
    }
}

// ─── Group filter ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupFilter {
    pub search: String,
    pub class_name: Choice<String>,
    pub subject: Choice<String>,
    /// Matches a group when any student on its roster has this status.
    pub status: Choice<Status>,
}

impl Filter<ActivityGroup> for GroupFilter {
    fn matches(&self, g: &ActivityGroup) -> bool {
        let needle = self.search.to_lowercase();
        let search_ok = needle.is_empty()
            || contains_ci(&g.title, &needle)
            || contains_ci(&g.description, &needle)
            || g.students
                .iter()
                .any(|s| contains_ci(&s.student_name, &needle));
        let status_ok = match &self.status {
            Choice::All => true,
            Choice::Only(wanted) => g.students.iter().any(|s| s.status == *wanted),
        };
        search_ok
            && self.class_name.admits(&g.class_name)
            && self.subject.admits(&g.subject)
            && status_ok
    }
}

// ─── Page cursor ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub page_size: usize,
    /// 1-indexed.
    pub current: usize,
}

impl PageState {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current: 1,
        }
    }

    /// Never less than 1, even for an empty list.
    pub fn total_pages(&self, count: usize) -> usize {
        count.div_ceil(self.page_size).max(1)
    }

    pub fn range(&self, count: usize) -> std::ops::Range<usize> {
        let start = ((self.current - 1) * self.page_size).min(count);
        let end = (start + self.page_size).min(count);
        start..end
    }

    fn clamp(&mut self, count: usize) {
        self.current = self.current.clamp(1, self.total_pages(count));
    }
}

// ─── List view ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ListView<T, F> {
    items: Vec<T>,
    filter: F,
    page: PageState,
    /// Indices into `items` that pass `filter`, in collection order.
    visible: Vec<usize>,
}

pub type ActivityList = ListView<ActivityRecord, FilterState>;
pub type GroupList = ListView<ActivityGroup, GroupFilter>;

impl<T, F: Filter<T> + Default> ListView<T, F> {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            filter: F::default(),
            page: PageState::new(page_size),
            visible: Vec::new(),
        }
    }
}

impl<T, F: Filter<T>> ListView<T, F> {
    fn derive(&mut self) {
        self.visible = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.filter.matches(item))
            .map(|(i, _)| i)
            .collect();
        self.page.current = 1;
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.derive();
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    /// Apply `change` to the filter, then re-derive and return to page 1.
    pub fn update_filter(&mut self, change: impl FnOnce(&mut F)) {
        change(&mut self.filter);
        self.derive();
    }

    pub fn filtered(&self) -> impl Iterator<Item = &T> + '_ {
        self.visible.iter().map(|&i| &self.items[i])
    }

    pub fn filtered_len(&self) -> usize {
        self.visible.len()
    }

    pub fn page_items(&self) -> Vec<&T> {
        let range = self.page.range(self.visible.len());
        self.filtered().skip(range.start).take(range.len()).collect()
    }

    pub fn current_page(&self) -> usize {
        self.page.current
    }

    pub fn page_size(&self) -> usize {
        self.page.page_size
    }

    pub fn total_pages(&self) -> usize {
        self.page.total_pages(self.visible.len())
    }

    pub fn has_prev(&self) -> bool {
        self.page.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.page.current < self.total_pages()
    }

    /// No-op on the first page.
    pub fn prev_page(&mut self) {
        if self.has_prev() {
            self.page.current -= 1;
        }
    }

    /// No-op on the last page.
    pub fn next_page(&mut self) {
        if self.has_next() {
            self.page.current += 1;
        }
    }

    /// Jump straight to a 1-indexed page; out-of-range targets are clamped.
    pub fn go_to_page(&mut self, page: usize) {
        self.page.current = page;
        self.page.clamp(self.visible.len());
    }

    /// Replace the collection with a copy lacking the first item matching
    /// `pred`. Order of the others is kept.
    pub fn remove_first(&mut self, pred: impl Fn(&T) -> bool) -> Option<T>
    where
        T: Clone,
    {
        let idx = self.items.iter().position(|item| pred(item))?;
        let mut next = Vec::with_capacity(self.items.len().saturating_sub(1));
        next.extend(self.items[..idx].iter().cloned());
        next.extend(self.items[idx + 1..].iter().cloned());
        let removed = self.items[idx].clone();
        self.set_items(next);
        Some(removed)
    }

    /// Replace the first item matching `pred` (optimistic update after a
    /// successful call).
    pub fn replace_first(&mut self, pred: impl Fn(&T) -> bool, with: T)
    where
        T: Clone,
    {
        if let Some(idx) = self.items.iter().position(|item| pred(item)) {
            let mut next = self.items.clone();
            next[idx] = with;
            self.set_items(next);
        }
    }
}

impl ActivityList {
    pub fn remove_by_id(&mut self, id: &ActivityId) -> Option<ActivityRecord> {
        self.remove_first(|r| &r.id == id)
    }

    pub fn find(&self, id: &ActivityId) -> Option<&ActivityRecord> {
        self.items.iter().find(|r| &r.id == id)
    }

    pub fn subjects(&self) -> Vec<String> {
        distinct(self.items.iter().map(|r| r.subject.clone()))
    }

    pub fn count_by_status(&self, status: Status) -> usize {
        self.items.iter().filter(|r| r.status == status).count()
    }
}

impl GroupList {
    pub fn classes(&self) -> Vec<String> {
        distinct(self.items.iter().map(|g| g.class_name.clone()))
    }

    pub fn subjects(&self) -> Vec<String> {
        distinct(self.items.iter().map(|g| g.subject.clone()))
    }
}

/// Unique values in first-seen order.
pub fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

// ─── Grouping ───────────────────────────────────────────────────────────────

/// Fold roster rows into one card per activity id. Card details come from
/// the first row seen for that id; cards keep first-seen order.
pub fn group_rows(rows: &[RosterRow]) -> Vec<ActivityGroup> {
    let mut groups: Vec<ActivityGroup> = Vec::new();
    for row in rows {
        let entry = RosterEntry {
            row_id: row.row_id.clone(),
            student_name: row.student_name.clone(),
            status: row.status,
        };
        match groups.iter_mut().find(|g| g.activity_id == row.activity_id) {
            Some(group) => group.students.push(entry),
            None => groups.push(ActivityGroup {
                activity_id: row.activity_id.clone(),
                title: row.title.clone(),
                class_name: row.class_name.clone(),
                subject: row.subject.clone(),
                description: row.description.clone(),
                due_date: row.due_date,
                students: vec![entry],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use pretty_assertions::assert_eq;

    fn record(n: usize, subject: &str, status: Status) -> ActivityRecord {
        let mut r = demo::activities().remove(0);
        r.id = ActivityId(n.to_string());
        r.title = format!("Activity {n}");
        r.subject = subject.into();
        r.description = format!("Description {n}");
        r.status = status;
        r
    }

    fn twelve() -> Vec<ActivityRecord> {
        (1..=12)
            .map(|n| {
                let status = if n % 4 == 0 { Status::Graded } else { Status::Pending };
                let subject = if n % 2 == 0 { "Science" } else { "Mathematics" };
                record(n, subject, status)
            })
            .collect()
    }

    fn ids(items: &[&ActivityRecord]) -> Vec<String> {
        items.iter().map(|r| r.id.0.clone()).collect()
    }

    #[test]
    fn twelve_records_make_three_pages() {
        let mut list = ActivityList::new(PAGE_SIZE);
        list.set_items(twelve());
        assert_eq!(list.total_pages(), 3);
        assert_eq!(ids(&list.page_items()), vec!["1", "2", "3", "4", "5"]);

        list.go_to_page(3);
        assert_eq!(ids(&list.page_items()), vec!["11", "12"]);
    }

    #[test]
    fn pages_partition_the_filtered_view() {
        for count in 0..=23 {
            for size in 1..=6 {
                let mut list = ActivityList::new(size);
                list.set_items(twelve().into_iter().cycle().take(count).collect());

                let mut seen = Vec::new();
                for page in 1..=list.total_pages() {
                    list.go_to_page(page);
                    let items = list.page_items();
                    assert!(items.len() <= size);
                    seen.extend(items.into_iter().cloned());
                }
                let all: Vec<ActivityRecord> = list.filtered().cloned().collect();
                assert_eq!(seen, all, "count={count} size={size}");
            }
        }
    }

    #[test]
    fn empty_list_still_has_one_page() {
        let list = ActivityList::new(PAGE_SIZE);
        assert_eq!(list.total_pages(), 1);
        assert!(list.page_items().is_empty());
        assert!(!list.has_prev());
        assert!(!list.has_next());
    }

    #[test]
    fn prev_and_next_stop_at_the_edges() {
        let mut list = ActivityList::new(PAGE_SIZE);
        list.set_items(twelve());

        list.prev_page();
        assert_eq!(list.current_page(), 1);

        list.next_page();
        list.next_page();
        list.next_page();
        assert_eq!(list.current_page(), 3);
        assert!(!list.has_next());
    }

    #[test]
    fn filter_change_resets_to_first_page() {
        let mut list = ActivityList::new(PAGE_SIZE);
        list.set_items(twelve());
        list.go_to_page(3);

        list.update_filter(|f| f.subject = Choice::Only("Science".into()));
        assert_eq!(list.current_page(), 1);

        list.go_to_page(2);
        list.update_filter(|f| f.search = "activity".into());
        assert_eq!(list.current_page(), 1);
    }

    #[test]
    fn filtered_is_exactly_the_matching_subset() {
        let mut list = ActivityList::new(PAGE_SIZE);
        list.set_items(twelve());
        list.update_filter(|f| {
            f.search = "ACTIVITY 1".into();
            f.subject = Choice::Only("Science".into());
        });

        let expected: Vec<&ActivityRecord> = list
            .items()
            .iter()
            .filter(|r| list.filter().matches(r))
            .collect();
        let got: Vec<&ActivityRecord> = list.filtered().collect();
        assert_eq!(got, expected);
        // "Activity 10" and "Activity 12" are Science; "Activity 1"/"11" are not.
        assert_eq!(ids(&got), vec!["10", "12"]);
    }

    #[test]
    fn status_filter_keeps_only_graded() {
        let mut list = ActivityList::new(PAGE_SIZE);
        let mut records = twelve();
        for r in records.iter_mut() {
            r.status = Status::Pending;
        }
        records[2].status = Status::Graded;
        records[7].status = Status::Graded;
        list.set_items(records);

        list.update_filter(|f| f.status = Choice::Only(Status::Graded));
        assert_eq!(list.filtered_len(), 2);
        assert!(list.filtered().all(|r| r.status == Status::Graded));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let mut list = ActivityList::new(PAGE_SIZE);
        list.set_items(demo::activities());
        list.update_filter(|f| f.search = "fraction".into());
        let titles: Vec<&str> = list.filtered().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Math Worksheet: Fractions"]);
    }

    #[test]
    fn search_covers_subject_and_description() {
        let mut list = ActivityList::new(PAGE_SIZE);
        list.set_items(demo::activities());

        list.update_filter(|f| f.search = "HISTORY".into());
        assert_eq!(list.filtered_len(), 1);

        list.update_filter(|f| f.search = "literary devices".into());
        assert_eq!(list.filtered_len(), 1);
    }

    #[test]
    fn search_text_is_matched_as_typed() {
        let mut list = ActivityList::new(PAGE_SIZE);
        list.set_items(demo::activities());

        list.update_filter(|f| f.search = "fraction ".into());
        assert_eq!(list.filtered_len(), 0);

        list.update_filter(|f| f.search = "  ".into());
        assert_eq!(list.filtered_len(), 0);

        list.update_filter(|f| f.search.clear());
        assert_eq!(list.filtered_len(), 8);
    }

    #[test]
    fn delete_removes_exactly_one_and_keeps_order() {
        let mut list = ActivityList::new(PAGE_SIZE);
        list.set_items(twelve());
        list.go_to_page(2);

        let removed = list.remove_by_id(&ActivityId::from("7")).unwrap();
        assert_eq!(removed.id, ActivityId::from("7"));
        assert_eq!(list.items().len(), 11);
        assert_eq!(list.current_page(), 1);

        let remaining: Vec<String> = list.items().iter().map(|r| r.id.0.clone()).collect();
        let expected: Vec<String> = (1..=12)
            .filter(|n| *n != 7)
            .map(|n| n.to_string())
            .collect();
        assert_eq!(remaining, expected);

        assert!(list.remove_by_id(&ActivityId::from("7")).is_none());
    }

    #[test]
    fn go_to_page_clamps() {
        let mut list = ActivityList::new(PAGE_SIZE);
        list.set_items(twelve());
        list.go_to_page(99);
        assert_eq!(list.current_page(), 3);
        list.go_to_page(0);
        assert_eq!(list.current_page(), 1);
    }

    #[test]
    fn choice_cycles_through_options() {
        let options = vec!["Art".to_string(), "Science".to_string()];
        let c = Choice::All.cycle(&options);
        assert_eq!(c, Choice::Only("Art".into()));
        let c = c.cycle(&options);
        assert_eq!(c, Choice::Only("Science".into()));
        assert_eq!(c.cycle(&options), Choice::All);
        assert_eq!(Choice::Only("Gone".to_string()).cycle(&options), Choice::Only("Art".into()));
    }

    #[test]
    fn subjects_in_first_seen_order() {
        let mut list = ActivityList::new(PAGE_SIZE);
        list.set_items(demo::activities());
        assert_eq!(
            list.subjects(),
            vec!["Mathematics", "Science", "English", "History", "Art"]
        );
    }

    #[test]
    fn rows_group_by_activity_id() {
        let mut rows = demo::roster_rows();
        let mut extra = rows[0].clone();
        extra.row_id = Some("9".into());
        extra.student_name = "Noah Clark".into();
        extra.status = Status::Pending;
        extra.title = "Ignored title".into();
        rows.push(extra);

        let groups = group_rows(&rows);
        assert_eq!(groups.len(), 8);
        assert_eq!(groups[0].title, "Quadratic Equations");
        let names: Vec<&str> = groups[0]
            .students
            .iter()
            .map(|s| s.student_name.as_str())
            .collect();
        assert_eq!(names, vec!["Emily Johnson", "Noah Clark"]);
    }

    #[test]
    fn group_status_filter_matches_any_student() {
        let mut rows = demo::roster_rows();
        let mut extra = rows[0].clone();
        extra.student_name = "Noah Clark".into();
        extra.status = Status::Overdue;
        rows.push(extra);

        let mut list = GroupList::new(PAGE_SIZE);
        list.set_items(group_rows(&rows));
        list.update_filter(|f| f.status = Choice::Only(Status::Overdue));

        let ids: Vec<&str> = list.filtered().map(|g| g.activity_id.as_str()).collect();
        assert_eq!(ids, vec!["act-101", "act-104"]);

        list.update_filter(|f| {
            f.status = Choice::All;
            f.search = "noah".into();
        });
        assert_eq!(list.filtered_len(), 1);

        list.update_filter(|f| {
            f.search.clear();
            f.class_name = Choice::Only("Grade 10-B".into());
        });
        assert_eq!(list.filtered_len(), 2);
        assert_eq!(list.classes().len(), 6);
    }
}
