//! Test doubles shared by the unit tests.

use image::Rgb;

use crate::core_modules::renderer::BlobRenderer;

/// One recorded renderer call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Primitive {
    Point { row: i32, col: i32, color: Rgb<u8> },
    Line {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: Rgb<u8>,
        thickness: u32,
    },
    Circle {
        x: i32,
        y: i32,
        radius: i32,
        color: Rgb<u8>,
        thickness: u32,
    },
    Rectangle {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Rgb<u8>,
        thickness: u32,
    },
    Clear { color: Rgb<u8> },
}

/// Records every primitive instead of drawing it.
#[derive(Debug, Default)]
pub(crate) struct RecordingRenderer {
    pub calls: Vec<Primitive>,
}

impl RecordingRenderer {
    pub fn lines(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Primitive::Line { .. }))
            .count()
    }

    pub fn rectangles(&self) -> Vec<&Primitive> {
        self.calls
            .iter()
            .filter(|call| matches!(call, Primitive::Rectangle { .. }))
            .collect()
    }
}

impl BlobRenderer for RecordingRenderer {
    fn point(&mut self, row: i32, col: i32, color: Rgb<u8>) {
        self.calls.push(Primitive::Point { row, col, color });
    }

    fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb<u8>, thickness: u32) {
        self.calls.push(Primitive::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            thickness,
        });
    }

    fn circle(&mut self, x: i32, y: i32, radius: i32, color: Rgb<u8>, thickness: u32) {
        self.calls.push(Primitive::Circle {
            x,
            y,
            radius,
            color,
            thickness,
        });
    }

    fn rectangle(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Rgb<u8>,
        thickness: u32,
    ) {
        self.calls.push(Primitive::Rectangle {
            x,
            y,
            width,
            height,
            color,
            thickness,
        });
    }

    fn clear_background(&mut self, color: Rgb<u8>) {
        self.calls.push(Primitive::Clear { color });
    }
}
