use tiny_skia as sk;

use crate::dna::{Genome, Polygon};

/// rasterization seam: the engine never touches pixels itself, it hands the
/// ordered population to a renderer and gets back an interleaved RGBA buffer of
/// exactly width * height * 4 bytes.
pub trait Renderer {
    fn render(&mut self, genome: &Genome) -> Vec<u8>;
}

/// tiny-skia CPU rasterizer. polygons are filled back-to-front with the winding
/// fill rule onto an opaque white canvas. because the canvas is opaque the
/// composite's alpha plane is constant 255, so tiny-skia's premultiplied bytes
/// are identical to straight-alpha bytes and directly comparable to the target.
pub struct CpuRenderer {
    anti_alias: bool,
    // scratch pixmap reused across rounds to avoid per-render allocations
    scratch: Option<sk::Pixmap>,
}

impl CpuRenderer {
    pub fn new(anti_alias: bool) -> Self {
        Self { anti_alias, scratch: None }
    }
}

impl Default for CpuRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Renderer for CpuRenderer {
    fn render(&mut self, genome: &Genome) -> Vec<u8> {
        profiling::scope!("render");
        let (w, h) = (genome.width, genome.height);

        let need_new = match self.scratch.as_ref() {
            Some(pix) => pix.width() != w || pix.height() != h,
            None => true,
        };
        if need_new {
            // dims were validated at genome construction, Pixmap::new only
            // rejects zero sizes
            self.scratch = Some(sk::Pixmap::new(w, h).expect("non-zero pixmap dims"));
        }
        let pix = self.scratch.as_mut().expect("scratch pixmap present");

        // white background (classic Evolve-style canvas)
        pix.fill(sk::Color::WHITE);

        for poly in &genome.polys {
            draw_polygon(pix, poly, self.anti_alias);
        }
        pix.data().to_vec()
    }
}

fn draw_polygon(pix: &mut sk::Pixmap, poly: &Polygon, anti_alias: bool) {
    profiling::scope!("draw_polygon");

    // vertices mutate between rounds, so the path is rebuilt every draw
    let mut pb = sk::PathBuilder::new();
    pb.move_to(poly.points[0].x as f32, poly.points[0].y as f32);
    for p in &poly.points[1..] {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.close();
    let path = match pb.finish() {
        Some(path) => path,
        // fully degenerate polygon (all vertices identical) covers no pixels
        None => return,
    };

    let c = poly.color;
    let color = sk::Color::from_rgba8(c.r, c.g, c.b, c.a);
    let mut paint = sk::Paint::default();
    paint.anti_alias = anti_alias;
    paint.shader = sk::Shader::SolidColor(color);

    pix.fill_path(
        &path,
        &paint,
        sk::FillRule::Winding,
        sk::Transform::identity(),
        None,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dna::{Color, Point};

    fn genome_with(polys: Vec<Polygon>) -> Genome {
        Genome { width: 8, height: 8, polys }
    }

    #[test]
    fn test_buffer_layout() {
        let mut renderer = CpuRenderer::default();
        let rgba = renderer.render(&genome_with(vec![]));
        assert_eq!(rgba.len(), 8 * 8 * 4);
        // empty population renders the bare white canvas
        assert!(rgba.iter().all(|&b| b == 255));
    }

    #[test]
    fn test_opaque_polygon_covers_canvas() {
        let full = Polygon::new(
            vec![
                Point { x: 0, y: 0 },
                Point { x: 8, y: 0 },
                Point { x: 8, y: 8 },
                Point { x: 0, y: 8 },
            ],
            Color { r: 255, g: 0, b: 0, a: 255 },
        )
        .unwrap();

        let mut renderer = CpuRenderer::new(false);
        let rgba = renderer.render(&genome_with(vec![full]));
        for px in rgba.chunks_exact(4) {
            assert_eq!(px, &[255, 0, 0, 255]);
        }
    }

    #[test]
    fn test_draw_order_is_back_to_front() {
        let square = |color| {
            Polygon::new(
                vec![
                    Point { x: 0, y: 0 },
                    Point { x: 8, y: 0 },
                    Point { x: 8, y: 8 },
                    Point { x: 0, y: 8 },
                ],
                color,
            )
            .unwrap()
        };
        let red = square(Color { r: 255, g: 0, b: 0, a: 255 });
        let blue = square(Color { r: 0, g: 0, b: 255, a: 255 });

        let mut renderer = CpuRenderer::new(false);
        let rgba = renderer.render(&genome_with(vec![red, blue]));
        // blue is later in the array, so it draws on top
        assert_eq!(&rgba[0..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn test_composite_alpha_is_opaque() {
        let translucent = Polygon::new(
            vec![
                Point { x: 1, y: 1 },
                Point { x: 7, y: 2 },
                Point { x: 3, y: 7 },
            ],
            Color { r: 10, g: 200, b: 40, a: 90 },
        )
        .unwrap();

        let mut renderer = CpuRenderer::default();
        let rgba = renderer.render(&genome_with(vec![translucent]));
        // translucent fill over an opaque canvas stays opaque everywhere
        assert!(rgba.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_scratch_reuse_across_sizes() {
        let mut renderer = CpuRenderer::default();
        let small = renderer.render(&genome_with(vec![]));
        let big = renderer.render(&Genome { width: 16, height: 4, polys: vec![] });
        assert_eq!(small.len(), 8 * 8 * 4);
        assert_eq!(big.len(), 16 * 4 * 4);
    }
}
