pub type PresenterResult<T> = Result<T, PresenterError>;

#[derive(thiserror::Error, Debug)]
pub enum PresenterError {
    /// The rendering boundary failed while painting a mounted scene.
    #[error("render fault: {0}")]
    RenderFault(String),

    #[error("script error: {0}")]
    Script(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PresenterError {
    pub fn render_fault(msg: impl Into<String>) -> Self {
        Self::RenderFault(msg.into())
    }

    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script(msg.into())
    }

    pub fn is_render_fault(&self) -> bool {
        matches!(self, Self::RenderFault(_))
    }
}
