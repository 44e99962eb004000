//! Image source port for loading encoded images.

use crate::domain::BatchItem;

/// Port for loading images from a source.
pub trait ImageSource: Send + Sync {
    /// Returns an iterator over the images of this source, as raw bytes.
    ///
    /// An input that is known but cannot be read should be yielded as
    /// [`BatchItem::unreadable`] so it is still reported. Undecodable content
    /// is not an error here; the scorer reports it per image.
    ///
    /// # Errors
    ///
    /// Individual items may be errors when the source cannot even tell which
    /// input failed.
    fn items(&self) -> Box<dyn Iterator<Item = anyhow::Result<BatchItem>> + Send + '_>;

    /// Returns the total number of images, if known.
    fn count_hint(&self) -> Option<usize>;
}
