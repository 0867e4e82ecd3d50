//! Paginated fetching
//!
//! Turns a [`FetchPlan`] into an ordered stream of pages.
//!
//! Offset paging keeps up to `batch_size` requests in flight. Offsets are
//! claimed from a shared [`CursorAllocator`] and pages are yielded strictly in
//! offset order, whatever order the responses arrive in. The first short page
//! ends the stream; requests already issued past it are dropped.
//!
//! Key paging needs the previous page's last key, so it runs one request at a
//! time.

use crate::error::Result;
use crate::pagination::{
    CursorAllocator, KeyPaginator, NextPage, NoPaginator, OffsetPaginator, Page, PageCursor,
    PageRequest, Paginator,
};
use crate::types::RawRow;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::debug;

/// Something that can serve a page of rows
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the rows for one page request
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<RawRow>>;
}

/// How a resource is paged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagingPlan {
    /// Concurrent offset paging
    Offset {
        /// Maximum requests in flight
        batch_size: usize,
    },
    /// Sequential key paging
    Key {
        /// Ordering column
        key_field: String,
        /// Position of the ordering column in a row
        key_index: usize,
    },
    /// One request for the whole resource
    Unpaged,
}

/// Everything needed to issue the page requests of one run
#[derive(Debug, Clone)]
pub struct FetchPlan {
    /// Paging policy
    pub paging: PagingPlan,
    /// Template for every request (page size and incremental filter)
    pub template: PageRequest,
}

/// Stream the pages of a plan in cursor order
pub fn fetch_pages<'a, S>(source: &'a S, plan: FetchPlan) -> BoxStream<'a, Result<Page>>
where
    S: PageSource + ?Sized,
{
    match plan.paging {
        PagingPlan::Offset { batch_size } => offset_pages(source, plan.template, batch_size),
        PagingPlan::Key {
            key_field,
            key_index,
        } => {
            let paginator = KeyPaginator::new(key_field.clone(), key_index);
            let template = plan.template.with_key_field(key_field);
            sequential_pages(source, paginator, template)
        }
        PagingPlan::Unpaged => sequential_pages(source, NoPaginator, plan.template),
    }
}

fn offset_pages<'a, S>(
    source: &'a S,
    template: PageRequest,
    batch_size: usize,
) -> BoxStream<'a, Result<Page>>
where
    S: PageSource + ?Sized,
{
    let paginator = OffsetPaginator::new(template.page_size);
    let allocator = CursorAllocator::new(0, template.page_size);

    let in_flight = stream::repeat_with(move || template.at(PageCursor::Offset(allocator.allocate())))
        .map(move |request| fetch_one(source, request))
        .buffered(batch_size.max(1))
        .boxed();

    // Dropping `in_flight` after the last page cancels the requests beyond it
    stream::unfold(Some(in_flight), move |state| {
        let paginator = paginator.clone();
        async move {
            let mut in_flight = state?;
            let checked = in_flight.next().await?.and_then(|page| {
                let last = paginator.next_page(&page.request, &page.rows)?.is_done();
                Ok((page, last))
            });
            match checked {
                Ok((page, false)) => Some((Ok(page), Some(in_flight))),
                Ok((page, true)) => Some((Ok(page), None)),
                Err(e) => Some((Err(e), None)),
            }
        }
    })
    .boxed()
}

fn sequential_pages<'a, S, P>(
    source: &'a S,
    paginator: P,
    template: PageRequest,
) -> BoxStream<'a, Result<Page>>
where
    S: PageSource + ?Sized,
    P: Paginator + Clone + 'a,
{
    let first = template.at(paginator.first_cursor());

    stream::unfold(Some(first), move |next| {
        let paginator = paginator.clone();
        async move {
            let request = next?;
            let page = match fetch_one(source, request).await {
                Ok(page) => page,
                Err(e) => return Some((Err(e), None)),
            };
            match paginator.next_page(&page.request, &page.rows) {
                Ok(NextPage::Continue(cursor)) => {
                    let following = page.request.at(cursor);
                    Some((Ok(page), Some(following)))
                }
                Ok(NextPage::Done) => Some((Ok(page), None)),
                Err(e) => Some((Err(e), None)),
            }
        }
    })
    .boxed()
}

async fn fetch_one<S>(source: &S, request: PageRequest) -> Result<Page>
where
    S: PageSource + ?Sized,
{
    let rows = source.fetch_page(&request).await?;
    debug!("Fetched {} rows ({})", rows.len(), request.cursor);
    Ok(Page { request, rows })
}
