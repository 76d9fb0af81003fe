//! Annotation identity allocation
//!
//! Every relation annotation, and every annotation the tier surface creates
//! on the fly, gets an integer identity from a single allocator owned by the
//! parser. Identities start at 0 and are never reused within one parse run.

/// Allocated annotation identity
pub type AnnotationId = usize;

/// Monotonic identity counter scoped to one parse run
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: AnnotationId,
}

impl IdAllocator {
    /// Create an allocator whose first identity is 0
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocate the next identity
    #[inline]
    pub fn next_id(&mut self) -> AnnotationId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The identity the next call to `next_id` will return
    #[inline]
    pub fn peek(&self) -> AnnotationId {
        self.next
    }
}
