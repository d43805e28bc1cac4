use crate::error::{DetectionError, Result};
use crate::port::{ModelDocument, ViewContext};

/// Context for one clash run: the document and, optionally, the view the
/// run is scoped to.
pub struct ClashSession<'d, D: ModelDocument> {
    document: &'d mut D,
    view: Option<ViewContext<D::ViewId>>,
}

impl<'d, D: ModelDocument> ClashSession<'d, D> {
    /// Creates a session that is not scoped to any view.
    pub fn new(document: &'d mut D) -> Self {
        Self {
            document,
            view: None,
        }
    }

    /// Scopes the session to the document's active view.
    ///
    /// # Errors
    ///
    /// Returns `DetectionError::NoActiveView` if the document has no active
    /// view with a drawing plane.
    pub fn scoped_to_active_view(mut self) -> Result<Self> {
        let view = self
            .document
            .active_view()
            .ok_or(DetectionError::NoActiveView)?;
        self.view = Some(view);
        Ok(self)
    }

    /// The view this session is scoped to.
    #[must_use]
    pub fn view(&self) -> Option<&ViewContext<D::ViewId>> {
        self.view.as_ref()
    }

    /// Read access to the document.
    #[must_use]
    pub fn document(&self) -> &D {
        &*self.document
    }

    /// Write access to the document.
    pub fn document_mut(&mut self) -> &mut D {
        &mut *self.document
    }
}
