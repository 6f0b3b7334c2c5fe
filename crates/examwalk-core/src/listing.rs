//! Client-side list shaping: grouping and pagination.

use serde::Serialize;

use crate::model::Question;

/// Questions sharing a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryGroup<'a> {
    pub category: &'a str,
    pub questions: Vec<&'a Question>,
}

/// Group questions by category.
///
/// Categories appear in the order they are first seen; questions keep their
/// input order within a group.
pub fn group_by_category(questions: &[Question]) -> Vec<CategoryGroup<'_>> {
    let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
    for q in questions {
        match groups.iter_mut().find(|g| g.category == q.category) {
            Some(group) => group.questions.push(q),
            None => groups.push(CategoryGroup {
                category: &q.category,
                questions: vec![q],
            }),
        }
    }
    groups
}

/// One page of an in-memory list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based page number actually served.
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<'a, T> Page<'a, T> {
    /// Slice out page `page` (1-based).
    ///
    /// Page 0 is treated as page 1 and pages past the end clamp to the last
    /// page. A `per_page` of 0 is treated as 1. An empty list has a single
    /// empty page.
    pub fn of(items: &'a [T], page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_items = items.len();
        let total_pages = total_items.div_ceil(per_page).max(1);
        let page = page.clamp(1, total_pages);

        let start = ((page - 1) * per_page).min(total_items);
        let end = (start + per_page).min(total_items);

        Self {
            items: &items[start..end],
            page,
            per_page,
            total_items,
            total_pages,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}
