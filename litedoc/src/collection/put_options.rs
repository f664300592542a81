/// Options for [`DocRef::put_with_options`](crate::collection::DocRef::put_with_options).
///
/// By default a put replaces the stored document body. With `merge` set the
/// record is merge-patched over the stored body instead, so keys absent from
/// the record are kept.
///
/// # Examples
///
/// ```rust,ignore
/// use litedoc::collection::{merge, PutOptions};
///
/// doc_ref.put_with_options(doc!{ "age": 43 }, &merge()).await?;
/// doc_ref.put_with_options(doc!{ "age": 43 }, &PutOptions::new(false)).await?;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOptions {
    merge: bool,
}

impl PutOptions {
    pub fn new(merge: bool) -> Self {
        PutOptions { merge }
    }

    pub fn is_merge(&self) -> bool {
        self.merge
    }
}

/// Creates `PutOptions` that merge the record into the stored document.
pub fn merge() -> PutOptions {
    PutOptions::new(true)
}
