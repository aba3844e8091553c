//! 从图元推导标注：线性、包围盒、角度与半径四类，彼此独立生成。

use std::f64::consts::FRAC_PI_4;

use autodim_core::document::{
    AngularDimension, BoundingBox, Dimension, DimensionConfig, Entity, Line, LinearDimension,
    RadiusDimension,
};
use autodim_core::geometry::{Bounds2D, Point2, Vector2};
use tracing::debug;

/// 短于此长度的边不标注。
pub const MIN_EDGE_LENGTH: f64 = 0.01;
/// 线段端点在此容差内视为相连。
pub const CONNECTIVITY_TOLERANCE: f64 = 0.001;
/// 角度落在 (MIN, MAX) 之外视为噪声或共线。
pub const MIN_ANGLE_DEGREES: f64 = 1.0;
pub const MAX_ANGLE_DEGREES: f64 = 179.0;

const RADIUS_PROBE_ANGLE: f64 = FRAC_PI_4;

pub fn bounding_box(entities: &[Entity]) -> BoundingBox {
    let mut bounds = Bounds2D::empty();
    for entity in entities {
        if let Some(entity_bounds) = entity.bounds() {
            bounds.include_bounds(&entity_bounds);
        }
    }
    BoundingBox::from_bounds(&bounds)
}

/// 按配置生成全部标注，顺序固定为线性、包围盒、角度、半径。
pub fn generate_dimensions(entities: &[Entity], config: &DimensionConfig) -> Vec<Dimension> {
    let mut dimensions = Vec::new();

    if config.linear {
        linear_dimensions(entities, &mut dimensions);
    }
    if config.bounding {
        bounding_dimensions(&bounding_box(entities), &mut dimensions);
    }
    if config.angular {
        angular_dimensions(entities, &mut dimensions);
    }
    if config.radius {
        radius_dimensions(entities, &mut dimensions);
    }

    debug!(
        entities = entities.len(),
        dimensions = dimensions.len(),
        "标注生成完成"
    );
    dimensions
}

fn linear_dimensions(entities: &[Entity], out: &mut Vec<Dimension>) {
    for entity in entities {
        match entity {
            Entity::Line(line) => out.extend(linear_dimension(line.start, line.end)),
            Entity::Polyline(polyline) => {
                for (start, end) in polyline.edges() {
                    out.extend(linear_dimension(start, end));
                }
            }
            Entity::Circle(_) => {}
        }
    }
}

fn linear_dimension(start: Point2, end: Point2) -> Option<Dimension> {
    let direction = Vector2::from_points(start, end);
    let length = direction.length();
    if length <= MIN_EDGE_LENGTH {
        return None;
    }
    let normal = Vector2::new(-direction.y() / length, direction.x() / length);
    Some(Dimension::Linear(LinearDimension {
        start,
        end,
        midpoint: start.midpoint(end),
        normal,
        value: length,
        label: fixed(length, 2),
    }))
}

fn bounding_dimensions(bbox: &BoundingBox, out: &mut Vec<Dimension>) {
    let bottom_right = Point2::new(bbox.max.x(), bbox.min.y());
    let top_left = Point2::new(bbox.min.x(), bbox.max.y());

    out.push(Dimension::Bounding(LinearDimension {
        start: bbox.min,
        end: bottom_right,
        midpoint: Point2::new(bbox.center.x(), bbox.min.y()),
        normal: Vector2::new(0.0, -1.0),
        value: bbox.width,
        label: format!("W: {}", fixed(bbox.width, 2)),
    }));
    out.push(Dimension::Bounding(LinearDimension {
        start: bbox.min,
        end: top_left,
        midpoint: Point2::new(bbox.min.x(), bbox.center.y()),
        normal: Vector2::new(-1.0, 0.0),
        value: bbox.height,
        label: format!("H: {}", fixed(bbox.height, 2)),
    }));
}

fn angular_dimensions(entities: &[Entity], out: &mut Vec<Dimension>) {
    for entity in entities {
        if let Entity::Polyline(polyline) = entity {
            for triple in polyline.vertices.windows(3) {
                out.extend(angle_at(triple[0], triple[1], triple[2]));
            }
        }
    }

    let lines: Vec<&Line> = entities
        .iter()
        .filter_map(|entity| match entity {
            Entity::Line(line) => Some(line),
            _ => None,
        })
        .collect();
    for corner in shared_corners(&lines) {
        out.extend(angle_at(corner.first, corner.vertex, corner.second));
    }
}

/// 两条线段在一个公共端点处相接形成的角。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub vertex: Point2,
    pub first: Point2,
    pub second: Point2,
}

/// 在所有无序线段对中查找相接端点，逐对比较（O(n²)，图纸规模可接受）。
pub fn shared_corners(lines: &[&Line]) -> Vec<Corner> {
    let mut corners = Vec::new();
    for (i, a) in lines.iter().enumerate() {
        for b in &lines[i + 1..] {
            if let Some(corner) = corner_between(a, b) {
                corners.push(corner);
            }
        }
    }
    corners
}

fn corner_between(a: &Line, b: &Line) -> Option<Corner> {
    let touches = |p: Point2, q: Point2| p.approx_eq(q, CONNECTIVITY_TOLERANCE);
    let (vertex, first, second) = if touches(a.end, b.start) {
        (a.end, a.start, b.end)
    } else if touches(a.start, b.end) {
        (a.start, a.end, b.start)
    } else if touches(a.end, b.end) {
        (a.end, a.start, b.start)
    } else if touches(a.start, b.start) {
        (a.start, a.end, b.end)
    } else {
        return None;
    };
    Some(Corner {
        vertex,
        first,
        second,
    })
}

fn angle_at(first: Point2, vertex: Point2, second: Point2) -> Option<Dimension> {
    let v1 = vertex.vector_to(first);
    let v2 = vertex.vector_to(second);
    if v1.length() <= MIN_EDGE_LENGTH || v2.length() <= MIN_EDGE_LENGTH {
        return None;
    }

    let mut degrees = (v2.angle() - v1.angle()).abs().to_degrees();
    if degrees > 180.0 {
        degrees = 360.0 - degrees;
    }
    if degrees <= MIN_ANGLE_DEGREES || degrees >= MAX_ANGLE_DEGREES {
        return None;
    }

    Some(Dimension::Angular(AngularDimension {
        start: first,
        end: second,
        vertex,
        value: degrees,
        label: format!("{}°", fixed(degrees, 1)),
    }))
}

fn radius_dimensions(entities: &[Entity], out: &mut Vec<Dimension>) {
    for entity in entities {
        let Entity::Circle(circle) = entity else {
            continue;
        };
        let center = circle.center;
        let radius = circle.radius;
        let probe = Point2::new(
            center.x() + RADIUS_PROBE_ANGLE.cos() * radius,
            center.y() + RADIUS_PROBE_ANGLE.sin() * radius,
        );
        out.push(Dimension::Radius(RadiusDimension {
            start: center,
            end: probe,
            midpoint: center.midpoint(probe),
            value: radius,
            label: format!("R{}", fixed(radius, 2)),
        }));
    }
}

/// 固定小数位的标注文本。恰好落在中点的值远离零进位，`{:.N}` 在此处取偶。
pub fn fixed(value: f64, digits: usize) -> String {
    const GUARD: usize = 30;
    if !value.is_finite() {
        return format!("{value}");
    }
    let exact = format!("{:.*}", digits + GUARD, value.abs());
    let (kept, tail) = exact.split_at(exact.len() - GUARD);
    let is_tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');
    if !is_tie {
        return format!("{value:.digits$}");
    }

    let mut chars: Vec<char> = kept.trim_end_matches('.').chars().collect();
    let mut carry = true;
    for c in chars.iter_mut().rev() {
        match *c {
            '.' => {}
            '9' => *c = '0',
            digit => {
                *c = char::from(digit as u8 + 1);
                carry = false;
                break;
            }
        }
    }
    let mut text: String = chars.into_iter().collect();
    if carry {
        text.insert(0, '1');
    }
    if value.is_sign_negative() {
        text.insert(0, '-');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use autodim_core::document::{Circle, DimensionKind, Polyline};

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Entity {
        Entity::Line(Line::new(Point2::new(x1, y1), Point2::new(x2, y2)))
    }

    fn only(kind: DimensionKind) -> DimensionConfig {
        let mut config = DimensionConfig {
            linear: false,
            angular: false,
            radius: false,
            bounding: false,
        };
        config.set(kind, true);
        config
    }

    fn sample_drawing() -> Vec<Entity> {
        vec![
            line(0.0, 0.0, 5.0, 0.0),
            line(5.0, 0.0, 5.0, 5.0),
            Entity::Polyline(Polyline::new(
                [
                    Point2::new(10.0, 0.0),
                    Point2::new(20.0, 0.0),
                    Point2::new(20.0, 8.0),
                    Point2::new(10.0, 8.0),
                ],
                true,
            )),
            Entity::Circle(Circle::new(Point2::new(30.0, 5.0), 3.0)),
        ]
    }

    #[test]
    fn bounding_box_folds_segments_and_circle_extrema() {
        let entities = [
            line(0.0, 0.0, 10.0, 0.0),
            Entity::Circle(Circle::new(Point2::new(5.0, 5.0), 2.0)),
        ];
        let bbox = bounding_box(&entities);
        assert_eq!(bbox.min, Point2::new(0.0, 0.0));
        assert_eq!(bbox.max, Point2::new(10.0, 7.0));
        assert!((bbox.width - 10.0).abs() < 1e-9);
        assert!((bbox.height - 7.0).abs() < 1e-9);
        assert_eq!(bbox.center, Point2::new(5.0, 3.5));

        let circle_only = [Entity::Circle(Circle::new(Point2::new(5.0, 5.0), 2.0))];
        let bbox = bounding_box(&circle_only);
        assert_eq!(bbox.min, Point2::new(3.0, 3.0));
        assert_eq!(bbox.max, Point2::new(7.0, 7.0));
    }

    #[test]
    fn empty_drawing_uses_default_box() {
        assert_eq!(bounding_box(&[]), BoundingBox::default_extent());
        let dims = generate_dimensions(&[], &DimensionConfig::default());
        assert_eq!(dims.len(), 2);
        assert_eq!(dims[0].label(), "W: 100.00");
        assert_eq!(dims[1].label(), "H: 100.00");
    }

    #[test]
    fn zero_length_segment_has_no_linear_dimension() {
        let dims = generate_dimensions(&[line(0.0, 0.0, 0.0, 0.0)], &only(DimensionKind::Linear));
        assert!(dims.is_empty());

        let dims = generate_dimensions(
            &[line(0.0, 0.0, 0.005, 0.0)],
            &only(DimensionKind::Linear),
        );
        assert!(dims.is_empty());
    }

    #[test]
    fn linear_dimension_has_unit_normal_and_label() {
        let dims = generate_dimensions(&[line(0.0, 0.0, 3.0, 4.0)], &only(DimensionKind::Linear));
        assert_eq!(dims.len(), 1);
        let Dimension::Linear(dim) = &dims[0] else {
            panic!("expected linear dimension");
        };
        assert!((dim.value - 5.0).abs() < 1e-9);
        assert_eq!(dim.label, "5.00");
        assert!((dim.normal.x() + 0.8).abs() < 1e-9);
        assert!((dim.normal.y() - 0.6).abs() < 1e-9);
        assert_eq!(dim.midpoint, Point2::new(1.5, 2.0));
    }

    #[test]
    fn closed_polyline_gets_closing_edge() {
        let square = Entity::Polyline(Polyline::new(
            [
                Point2::new(0.0, 0.0),
                Point2::new(2.0, 0.0),
                Point2::new(2.0, 2.0),
                Point2::new(0.0, 2.0),
            ],
            true,
        ));
        let dims = generate_dimensions(&[square], &only(DimensionKind::Linear));
        assert_eq!(dims.len(), 4);
        assert_eq!(dims[3].start(), Point2::new(0.0, 2.0));
        assert_eq!(dims[3].end(), Point2::new(0.0, 0.0));
    }

    #[test]
    fn connected_segments_yield_right_angle() {
        let entities = [line(0.0, 0.0, 5.0, 0.0), line(5.0, 0.0, 5.0, 5.0)];
        let dims = generate_dimensions(&entities, &only(DimensionKind::Angular));
        assert_eq!(dims.len(), 1);
        let Dimension::Angular(dim) = &dims[0] else {
            panic!("expected angular dimension");
        };
        assert!((dim.value - 90.0).abs() < 1e-9);
        assert_eq!(dim.label, "90.0°");
        assert_eq!(dim.vertex, Point2::new(5.0, 0.0));
        assert_eq!(dim.start, Point2::new(0.0, 0.0));
        assert_eq!(dim.end, Point2::new(5.0, 5.0));
    }

    #[test]
    fn disjoint_segments_yield_no_angle() {
        let entities = [line(0.0, 0.0, 5.0, 0.0), line(5.01, 0.0, 5.0, 5.0)];
        assert!(generate_dimensions(&entities, &only(DimensionKind::Angular)).is_empty());

        // 容差内的端点视为相连。
        let entities = [line(0.0, 0.0, 5.0, 0.0), line(5.0005, 0.0, 5.0, 5.0)];
        assert_eq!(
            generate_dimensions(&entities, &only(DimensionKind::Angular)).len(),
            1
        );
    }

    #[test]
    fn reflex_angles_are_reflected() {
        let entities = [line(0.0, 0.0, 1.0, 0.0), line(0.0, 0.0, -1.0, -1.0)];
        let dims = generate_dimensions(&entities, &only(DimensionKind::Angular));
        assert_eq!(dims.len(), 1);
        assert!((dims[0].value() - 135.0).abs() < 1e-9);
        assert_eq!(dims[0].label(), "135.0°");
    }

    #[test]
    fn collinear_polyline_triple_has_no_angle() {
        let straight = Entity::Polyline(Polyline::new(
            [
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(2.0, 0.0),
            ],
            false,
        ));
        let folded = Entity::Polyline(Polyline::new(
            [
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(0.5, 0.0),
            ],
            false,
        ));
        let dims = generate_dimensions(&[straight, folded], &only(DimensionKind::Angular));
        assert!(dims.is_empty());
    }

    #[test]
    fn polyline_angles_use_sliding_window() {
        let zigzag = Entity::Polyline(Polyline::new(
            [
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 4.0),
                Point2::new(8.0, 4.0),
            ],
            false,
        ));
        let dims = generate_dimensions(&[zigzag], &only(DimensionKind::Angular));
        let vertices: Vec<Point2> = dims.iter().map(Dimension::midpoint).collect();
        assert_eq!(vertices, vec![Point2::new(4.0, 0.0), Point2::new(4.0, 4.0)]);
    }

    #[test]
    fn circle_gets_radius_probe_at_45_degrees() {
        let entities = [Entity::Circle(Circle::new(Point2::new(0.0, 0.0), 4.0))];
        let dims = generate_dimensions(&entities, &only(DimensionKind::Radius));
        assert_eq!(dims.len(), 1);
        let Dimension::Radius(dim) = &dims[0] else {
            panic!("expected radius dimension");
        };
        assert!((dim.value - 4.0).abs() < 1e-9);
        assert!((dim.end.x() - 2.828).abs() < 1e-3);
        assert!((dim.end.y() - 2.828).abs() < 1e-3);
        assert_eq!(dim.label, "R4.00");
        assert_eq!(dim.start, Point2::new(0.0, 0.0));
    }

    #[test]
    fn categories_follow_fixed_order() {
        let dims = generate_dimensions(&sample_drawing(), &DimensionConfig::default());
        let kinds: Vec<DimensionKind> = dims.iter().map(Dimension::kind).collect();
        let mut sorted = kinds.clone();
        sorted.sort_by_key(|kind| match kind {
            DimensionKind::Linear => 0,
            DimensionKind::Bounding => 1,
            DimensionKind::Angular => 2,
            DimensionKind::Radius => 3,
        });
        assert_eq!(kinds, sorted);
        // 2 条线段 + 4 条多段线边，2 个包围盒，1 个线段夹角 + 2 个多段线夹角，1 个半径。
        assert_eq!(dims.len(), 6 + 2 + 3 + 1);
    }

    #[test]
    fn generation_is_idempotent() {
        let entities = sample_drawing();
        let config = DimensionConfig::default();
        assert_eq!(
            generate_dimensions(&entities, &config),
            generate_dimensions(&entities, &config)
        );
    }

    #[test]
    fn disabling_a_category_removes_only_that_category() {
        let entities = sample_drawing();
        let full = generate_dimensions(&entities, &DimensionConfig::default());
        for kind in DimensionKind::ALL {
            let mut config = DimensionConfig::default();
            config.set(kind, false);
            let partial = generate_dimensions(&entities, &config);
            let expected: Vec<Dimension> = full
                .iter()
                .filter(|dim| dim.kind() != kind)
                .cloned()
                .collect();
            assert_eq!(partial, expected, "disabling {kind}");
        }
    }

    #[test]
    fn fixed_rounds_exact_ties_up() {
        assert_eq!(fixed(0.125, 2), "0.13");
        assert_eq!(fixed(2.625, 2), "2.63");
        assert_eq!(fixed(9.995, 2), "9.99");
        assert_eq!(fixed(99.5, 0), "100");
        assert_eq!(fixed(0.25, 1), "0.3");
        assert_eq!(fixed(-1.125, 2), "-1.13");
        assert_eq!(fixed(3.14159, 2), "3.14");
        assert_eq!(fixed(42.0, 1), "42.0");
    }

    #[test]
    fn imperial_fractions_label_like_decimal_rounding() {
        let entities = [
            line(0.0, 0.0, 2.625, 0.0),
            Entity::Circle(Circle::new(Point2::new(10.0, 10.0), 1.125)),
        ];
        let mut config = only(DimensionKind::Linear);
        config.radius = true;
        let labels: Vec<String> = generate_dimensions(&entities, &config)
            .iter()
            .map(|dim| dim.label().to_string())
            .collect();
        assert_eq!(labels, vec!["2.63", "R1.13"]);
    }

    #[test]
    fn near_zero_ray_has_no_angle() {
        let stub = Entity::Polyline(Polyline::new(
            [
                Point2::new(0.005, 0.0),
                Point2::new(0.0, 0.0),
                Point2::new(0.0, 5.0),
            ],
            false,
        ));
        assert!(generate_dimensions(&[stub], &only(DimensionKind::Angular)).is_empty());

        let long_enough = Entity::Polyline(Polyline::new(
            [
                Point2::new(0.02, 0.0),
                Point2::new(0.0, 0.0),
                Point2::new(0.0, 5.0),
            ],
            false,
        ));
        let dims = generate_dimensions(&[long_enough], &only(DimensionKind::Angular));
        assert_eq!(dims.len(), 1);
        assert_eq!(dims[0].label(), "90.0°");
    }
}
