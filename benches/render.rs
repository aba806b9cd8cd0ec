use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pdf_graphics::color::{DeviceColor, DeviceGray, DeviceRGB};
use pdf_graphics::comp_op::{CompositingOperation, PaintComposite};
use pdf_graphics::drawing_context::{DrawingContext, RenderOptions};
use pdf_graphics::gradient::{shape_linear_gradient, GradientPaint, GradientUnits};
use pdf_graphics::painted_path::PaintedPath;
use pdf_graphics::point::Point;
use pdf_graphics::resources::ResourceCatalog;
use pdf_graphics::trans_affine::Transform;

/// A grid of rounded rectangles, arcs and curves, some rotated.
fn shapes_drawing(count: usize) -> DrawingContext {
    let mut drawing = DrawingContext::new();
    for i in 0..count {
        let x = (i % 10) as f64 * 20.0;
        let y = (i / 10) as f64 * 20.0;
        let mut path = PaintedPath::new(x, y);
        path.rectangle(x, y, 15.0, 10.0, 3.0, 2.0)
            .move_to(x, y + 12.0)
            .arc_relative(6.0, 4.0, 30.0, false, true, 12.0, 0.0)
            .curve_relative(2.0, 3.0, 4.0, -3.0, 6.0, 0.0);
        if i % 3 == 0 {
            path.set_transform(Some(Transform::rotation_d(15.0).about(x, y)));
        }
        path.style_mut().set_stroke_width(0.5);
        path.style_mut()
            .set_fill_color(DeviceRGB::new(0.2, 0.4, (i % 7) as f64 / 7.0).unwrap());
        drawing.add_item(path).unwrap();
    }
    drawing
}

fn render_shapes(c: &mut Criterion) {
    let drawing = shapes_drawing(200);
    let options = RenderOptions::new(Point::origin(), 1.0, 842.0);
    c.bench_function("render_shapes_200", |b| {
        b.iter(|| {
            let mut catalog = ResourceCatalog::new();
            black_box(drawing.render(&mut catalog, &options).unwrap_or_default())
        })
    });
}

fn bounding_boxes(c: &mut Criterion) {
    let drawing = shapes_drawing(200);
    c.bench_function("bounding_box_200", |b| {
        b.iter(|| {
            for item in drawing.items() {
                black_box(item.bounding_box(Point::origin()));
            }
        })
    });
}

fn render_gradient_composite(c: &mut Criterion) {
    let stops: Vec<(f64, DeviceColor)> = vec![
        (0.0, DeviceRGB::new(1.0, 0.0, 0.0).unwrap().into()),
        (0.5, DeviceRGB::with_alpha(0.0, 1.0, 0.0, Some(0.5)).unwrap().into()),
        (1.0, DeviceGray::new(0.0).unwrap().into()),
    ];
    let mut drawing = DrawingContext::new();
    if let Ok(gradient) = shape_linear_gradient(0.0, 0.0, 1.0, 0.0, &stops) {
        let mut backdrop = PaintedPath::new(0.0, 0.0);
        backdrop.circle(50.0, 50.0, 40.0);
        backdrop.style_mut().set_fill_color(GradientPaint::new(
            gradient,
            GradientUnits::ObjectBoundingBox,
            None,
        ));
        let mut source = PaintedPath::new(0.0, 0.0);
        source.rectangle(30.0, 30.0, 60.0, 60.0, 5.0, 5.0);
        if let Ok(composite) = PaintComposite::new(backdrop, source, CompositingOperation::Xor) {
            drawing.add_item(composite).unwrap();
        }
    }
    let options = RenderOptions::new(Point::origin(), 1.0, 842.0);
    c.bench_function("render_gradient_xor", |b| {
        b.iter(|| {
            let mut catalog = ResourceCatalog::new();
            black_box(drawing.render(&mut catalog, &options).unwrap_or_default())
        })
    });
}

criterion_group!(benches, render_shapes, bounding_boxes, render_gradient_composite);
criterion_main!(benches);
