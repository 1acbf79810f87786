/// One vertex of the sprite: position and texture coordinate.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Four vertices in triangle-strip order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuadVertices(pub [Vertex; 4]);

impl QuadVertices {
    /// Axis-aligned rectangle covering `width` x `height` pixels with
    /// full-extent texture coordinates.
    pub fn sprite(width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self([
            Vertex {
                position: [0.0, 0.0, 0.0],
                uv: [0.0, 0.0],
            },
            Vertex {
                position: [w, 0.0, 0.0],
                uv: [1.0, 0.0],
            },
            Vertex {
                position: [0.0, h, 0.0],
                uv: [0.0, 1.0],
            },
            Vertex {
                position: [w, h, 0.0],
                uv: [1.0, 1.0],
            },
        ])
    }

    pub fn vertices(&self) -> &[Vertex; 4] {
        &self.0
    }

    pub fn extent(&self) -> (f32, f32) {
        let [x, y, _] = self.0[3].position;
        (x, y)
    }
}
