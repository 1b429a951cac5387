// Render surface module
// Lane-aware sketch presentation over an external script runtime

pub mod templates;

use thiserror::Error;

pub use templates::prepare_script;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Render window not available")]
    Unavailable,
    #[error("Script dispatch failed: {0}")]
    Dispatch(String),
    #[error("Resize failed: {0}")]
    Resize(String),
}

pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Visual output target, organised by lane
///
/// Every call is fire-and-forget: success means the request was handed to
/// the rendering runtime, not that anything finished drawing.
pub trait Surface: Send + Sync {
    /// Crossfade `code` into `lane_index`, leaving other lanes alone
    fn show(&self, code: &str, lane_index: usize) -> SurfaceResult<()>;

    /// Tear down every lane and show `code` as the single editor preview
    fn show_single(&self, code: &str) -> SurfaceResult<()>;

    /// Remove one lane's visual, or every lane's when `lane_index` is `None`
    fn clear(&self, lane_index: Option<usize>) -> SurfaceResult<()>;

    /// Remove the editor preview
    fn clear_single(&self) -> SurfaceResult<()>;

    /// Change the physical surface dimensions
    fn resize(&self, width: u32, height: u32) -> SurfaceResult<()>;
}

/// Destination that evaluates generated scripts, e.g. a webview
pub trait ScriptSink: Send + Sync {
    fn evaluate(&self, script: &str) -> SurfaceResult<()>;
    fn resize(&self, width: u32, height: u32) -> SurfaceResult<()>;
}

/// [`Surface`] that renders each request as a script for a [`ScriptSink`]
pub struct ScriptSurface<S> {
    sink: S,
    image_port: u16,
}

impl<S: ScriptSink> ScriptSurface<S> {
    /// `image_port` is the loopback port local images are served from
    pub fn new(sink: S, image_port: u16) -> Self {
        ScriptSurface { sink, image_port }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: ScriptSink> Surface for ScriptSurface<S> {
    fn show(&self, code: &str, lane_index: usize) -> SurfaceResult<()> {
        let script = prepare_script(code, self.image_port);
        self.sink
            .evaluate(&templates::lane_crossfade_js(lane_index, &script))
    }

    fn show_single(&self, code: &str) -> SurfaceResult<()> {
        let script = prepare_script(code, self.image_port);
        self.sink.evaluate(&templates::single_preview_js(&script))
    }

    fn clear(&self, lane_index: Option<usize>) -> SurfaceResult<()> {
        let js = match lane_index {
            Some(index) => templates::clear_lane_js(index),
            None => templates::clear_all_lanes_js().to_string(),
        };
        self.sink.evaluate(&js)
    }

    fn clear_single(&self) -> SurfaceResult<()> {
        self.sink.evaluate(templates::clear_single_preview_js())
    }

    fn resize(&self, width: u32, height: u32) -> SurfaceResult<()> {
        self.sink.resize(width, height)
    }
}
