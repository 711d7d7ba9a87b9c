use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::surface::{RenderTarget, Viewport};

const EXPORT_MODAL_BODY: &str = r#"<div class="modal-content">
    <span class="modal-close">&times;</span>
    <div class="modal-body">
        <i class="fas fa-spinner fa-spin"></i>
        <p>Generating CSV file...</p>
    </div>
</div>
"#;

/// Where a click inside the modal's overlay landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModalClick {
    Backdrop,
    Content,
    CloseControl,
}

pub struct Modal {
    target: Arc<dyn RenderTarget>,
    viewport: Arc<dyn Viewport>,
    open: AtomicBool,
}

impl Modal {
    pub fn new(target: Arc<dyn RenderTarget>, viewport: Arc<dyn Viewport>) -> Self {
        target.set_content(EXPORT_MODAL_BODY);
        target.hide();
        Self {
            target,
            viewport,
            open: AtomicBool::new(false),
        }
    }

    pub fn open(&self) {
        self.target.show();
        self.viewport.set_scroll_locked(true);
        self.open.store(true, Ordering::Release);
    }

    pub fn close(&self) {
        self.target.hide();
        self.viewport.set_scroll_locked(false);
        self.open.store(false, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub fn handle_click(&self, click: ModalClick) {
        match click {
            ModalClick::Backdrop | ModalClick::CloseControl => self.close(),
            ModalClick::Content => {}
        }
    }

    /// Opens the modal until the returned guard is dropped.
    pub fn session(&self) -> ModalSession<'_> {
        self.open();
        ModalSession { modal: self }
    }
}

pub struct ModalSession<'a> {
    modal: &'a Modal,
}

impl Drop for ModalSession<'_> {
    fn drop(&mut self) {
        self.modal.close();
    }
}
