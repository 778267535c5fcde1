use serde::{Deserialize, Serialize};

use crate::errors::RequestError;

pub const PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    #[serde(default)]
    page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(i64),
    Last,
}

impl PageQuery {
    pub fn new(page: impl Into<String>) -> Self {
        PageQuery {
            page: Some(page.into()),
        }
    }

    /// `?page=3`, `?page=last` or nothing at all (first page).
    pub fn parse(&self) -> Result<PageRequest, RequestError> {
        match self.page.as_deref().map(str::trim) {
            None | Some("") => Ok(PageRequest::Number(1)),
            Some("last") => Ok(PageRequest::Last),
            Some(raw) => raw
                .parse()
                .map(PageRequest::Number)
                .map_err(|_| RequestError::NotFound("Invalid page")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub number: i64,
    pub num_pages: i64,
    pub count: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageInfo {
    /// Resolves a requested page against a total row count. An empty list
    /// still has a first page; anything else out of range is not found.
    pub fn resolve(request: PageRequest, count: i64) -> Result<PageInfo, RequestError> {
        let num_pages = if count == 0 {
            1
        } else {
            (count + PAGE_SIZE - 1) / PAGE_SIZE
        };
        let number = match request {
            PageRequest::Last => num_pages,
            PageRequest::Number(number) => number,
        };
        if number < 1 || number > num_pages {
            return Err(RequestError::NotFound("Invalid page"));
        }
        Ok(PageInfo {
            number,
            num_pages,
            count,
            has_next: number < num_pages,
            has_previous: number > 1,
        })
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * PAGE_SIZE
    }
}
