//! Fetch planning for a bounded paginated traversal.

/// Intra-page stride for a full page: more pages follow, sample sparsely.
pub const FULL_PAGE_STRIDE: usize = 20;

/// Intra-page stride for the final, partial page.
pub const PARTIAL_PAGE_STRIDE: usize = 4;

/// Which pages to visit and how densely to sample them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPlan {
    pub page_length: u64,
    /// Page-number increment between fetched pages. Never zero.
    pub page_stride: u64,
    pub request_budget: u32,
    /// `ceil(total / page_length)`
    pub last_page: u64,
}

impl FetchPlan {
    pub fn new(total: u64, page_length: u64, request_budget: u32) -> Self {
        let page_length = page_length.max(1);
        let request_budget = request_budget.max(1);
        let last_page = total.div_ceil(page_length);
        let page_stride = last_page.div_ceil(u64::from(request_budget)).max(1);

        Self {
            page_length,
            page_stride,
            request_budget,
            last_page,
        }
    }

    /// Page numbers the plan expects to visit if the declared total is accurate.
    pub fn planned_pages(&self) -> impl Iterator<Item = u64> {
        let plan = *self;
        let first = (plan.last_page > 0).then_some(1);
        std::iter::successors(first, move |&page| {
            let next = plan.next_page(page);
            (next <= plan.last_page).then_some(next)
        })
    }

    /// Page to fetch after `page`. A stride that would overshoot the last
    /// page lands on it instead, so the newest items are always read.
    pub fn next_page(&self, page: u64) -> u64 {
        let next = page + self.page_stride;
        if page < self.last_page && next > self.last_page {
            self.last_page
        } else {
            next
        }
    }

    /// Hard cap on pages visited, including one probe past a stale total.
    pub fn max_requests(&self) -> u32 {
        self.request_budget + 1
    }

    /// Stride between sampled items of a page holding `len` items.
    pub fn intra_page_stride(&self, len: usize) -> usize {
        if len as u64 >= self.page_length {
            FULL_PAGE_STRIDE
        } else {
            PARTIAL_PAGE_STRIDE
        }
    }

    pub fn is_last_page(&self, len: usize) -> bool {
        (len as u64) < self.page_length
    }
}
