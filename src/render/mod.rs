pub mod color;
pub mod raster;
pub mod spiro;
pub mod stroke;

pub use color::{Rgba, StrokeStyle};
pub use raster::Canvas;
pub use spiro::{render, RenderOutput, RenderParams, RenderSummary, Rotor, RotorMode};
pub use stroke::{Point, StrokeRecorder, StrokeSink, Viewport};
