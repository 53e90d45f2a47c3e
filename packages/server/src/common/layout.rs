//! Grid geometry: how square numbers map onto pages.
//!
//! Squares are numbered from 1. Page `p` owns the contiguous block
//! `[(p - 1) * squares_per_page + 1, p * squares_per_page]`.

use std::ops::RangeInclusive;

use anyhow::{bail, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLayout {
    squares_per_page: u32,
    page_count: u32,
}

impl GridLayout {
    pub const DEFAULT_SQUARES_PER_PAGE: u32 = 200;
    pub const DEFAULT_PAGE_COUNT: u32 = 10;

    pub fn new(squares_per_page: u32, page_count: u32) -> Result<Self> {
        if squares_per_page == 0 || page_count == 0 {
            bail!("grid layout needs at least one page of one square");
        }
        if squares_per_page.checked_mul(page_count).is_none() {
            bail!("grid layout is too large");
        }
        Ok(Self {
            squares_per_page,
            page_count,
        })
    }

    pub fn squares_per_page(&self) -> u32 {
        self.squares_per_page
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn total_squares(&self) -> u32 {
        self.squares_per_page * self.page_count
    }

    pub fn contains(&self, square: u32) -> bool {
        (1..=self.total_squares()).contains(&square)
    }

    /// Page owning `square` (`ceil(square / squares_per_page)`).
    pub fn page_of(&self, square: u32) -> u32 {
        square.saturating_sub(1) / self.squares_per_page + 1
    }

    /// Square numbers owned by `page`, or `None` for an unknown page.
    pub fn page_range(&self, page: u32) -> Option<RangeInclusive<u32>> {
        if page == 0 || page > self.page_count {
            return None;
        }
        let first = (page - 1) * self.squares_per_page + 1;
        Some(first..=page * self.squares_per_page)
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            squares_per_page: Self::DEFAULT_SQUARES_PER_PAGE,
            page_count: Self::DEFAULT_PAGE_COUNT,
        }
    }
}
