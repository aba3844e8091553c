pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn midpoint(self, other: Point2) -> Point2 {
            Self((self.0 + other.0) * 0.5)
        }

        /// 两点在各轴上的差值均小于 `tolerance` 时视为重合。
        #[inline]
        pub fn approx_eq(self, other: Point2, tolerance: f64) -> bool {
            (self.0.x - other.0.x).abs() < tolerance && (self.0.y - other.0.y).abs() < tolerance
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量，用于法向量与偏移量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn scale(self, factor: f64) -> Self {
            Self(self.0 * factor)
        }

        /// 极角（弧度），取值范围 (-π, π]。
        #[inline]
        pub fn angle(self) -> f64 {
            self.0.y.atan2(self.0.x)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框，用于估算图纸范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            self.min.midpoint(self.max)
        }
    }
}

pub mod document {
    use std::fmt;
    use std::str::FromStr;

    use serde::{Deserialize, Serialize};

    use crate::geometry::{Bounds2D, Point2, Vector2};

    /// 解码得到的平面图元，仅支持线段、多段线与圆三种。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "kind", rename_all = "snake_case")]
    pub enum Entity {
        Line(Line),
        Polyline(Polyline),
        Circle(Circle),
    }

    impl Entity {
        /// 计算实体的 2D 轴对齐范围；圆取圆心 ± 半径的四个极值。
        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            match self {
                Entity::Line(line) => {
                    bounds.include_point(line.start);
                    bounds.include_point(line.end);
                }
                Entity::Polyline(polyline) => {
                    for vertex in &polyline.vertices {
                        bounds.include_point(*vertex);
                    }
                }
                Entity::Circle(circle) => {
                    let center = circle.center;
                    let radius = circle.radius;
                    bounds.include_point(Point2::new(center.x() - radius, center.y() - radius));
                    bounds.include_point(Point2::new(center.x() + radius, center.y() + radius));
                }
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
    }

    impl Line {
        #[inline]
        pub fn new(start: Point2, end: Point2) -> Self {
            Self { start, end }
        }

        #[inline]
        pub fn length(&self) -> f64 {
            self.start.distance(self.end)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Polyline {
        pub vertices: Vec<Point2>,
        pub is_closed: bool,
    }

    impl Polyline {
        pub fn new(vertices: impl IntoIterator<Item = Point2>, is_closed: bool) -> Self {
            Self {
                vertices: vertices.into_iter().collect(),
                is_closed,
            }
        }

        /// 依次返回相邻顶点构成的边；闭合且至少两个顶点时追加末点到首点的闭合边。
        pub fn edges(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
            let open = self.vertices.windows(2).map(|pair| (pair[0], pair[1]));
            let closing = match (self.is_closed, self.vertices.first(), self.vertices.last()) {
                (true, Some(first), Some(last)) if self.vertices.len() > 1 => Some((*last, *first)),
                _ => None,
            };
            open.chain(closing)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Circle {
        pub center: Point2,
        pub radius: f64,
    }

    impl Circle {
        #[inline]
        pub fn new(center: Point2, radius: f64) -> Self {
            Self { center, radius }
        }
    }

    /// 标注类别。`Bounding` 对应整体宽高标注。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum DimensionKind {
        Linear,
        Bounding,
        Angular,
        Radius,
    }

    impl DimensionKind {
        pub const ALL: [DimensionKind; 4] = [
            DimensionKind::Linear,
            DimensionKind::Bounding,
            DimensionKind::Angular,
            DimensionKind::Radius,
        ];

        pub fn as_str(self) -> &'static str {
            match self {
                DimensionKind::Linear => "linear",
                DimensionKind::Bounding => "bounding",
                DimensionKind::Angular => "angular",
                DimensionKind::Radius => "radius",
            }
        }
    }

    impl fmt::Display for DimensionKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl FromStr for DimensionKind {
        type Err = String;

        fn from_str(value: &str) -> Result<Self, Self::Err> {
            match value.trim().to_ascii_lowercase().as_str() {
                "linear" => Ok(DimensionKind::Linear),
                "bounding" => Ok(DimensionKind::Bounding),
                "angular" => Ok(DimensionKind::Angular),
                "radius" => Ok(DimensionKind::Radius),
                other => Err(other.to_string()),
            }
        }
    }

    /// 各类标注的开关，缺省全部开启。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct DimensionConfig {
        pub linear: bool,
        pub angular: bool,
        pub radius: bool,
        pub bounding: bool,
    }

    impl DimensionConfig {
        #[inline]
        pub fn is_enabled(&self, kind: DimensionKind) -> bool {
            match kind {
                DimensionKind::Linear => self.linear,
                DimensionKind::Bounding => self.bounding,
                DimensionKind::Angular => self.angular,
                DimensionKind::Radius => self.radius,
            }
        }

        pub fn set(&mut self, kind: DimensionKind, enabled: bool) {
            match kind {
                DimensionKind::Linear => self.linear = enabled,
                DimensionKind::Bounding => self.bounding = enabled,
                DimensionKind::Angular => self.angular = enabled,
                DimensionKind::Radius => self.radius = enabled,
            }
        }
    }

    impl Default for DimensionConfig {
        fn default() -> Self {
            Self {
                linear: true,
                angular: true,
                radius: true,
                bounding: true,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct LinearDimension {
        pub start: Point2,
        pub end: Point2,
        pub midpoint: Point2,
        /// 单位法向量，写出时尺寸线沿此方向偏移。
        pub normal: Vector2,
        pub value: f64,
        pub label: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RadiusDimension {
        pub start: Point2,
        pub end: Point2,
        pub midpoint: Point2,
        pub value: f64,
        pub label: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct AngularDimension {
        pub start: Point2,
        pub end: Point2,
        /// 角的顶点；文字直接放在此处。
        pub vertex: Point2,
        pub value: f64,
        pub label: String,
    }

    /// 由几何分析派生的只读标注。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "kind", rename_all = "snake_case")]
    pub enum Dimension {
        Linear(LinearDimension),
        Bounding(LinearDimension),
        Radius(RadiusDimension),
        Angular(AngularDimension),
    }

    impl Dimension {
        #[inline]
        pub fn kind(&self) -> DimensionKind {
            match self {
                Dimension::Linear(_) => DimensionKind::Linear,
                Dimension::Bounding(_) => DimensionKind::Bounding,
                Dimension::Radius(_) => DimensionKind::Radius,
                Dimension::Angular(_) => DimensionKind::Angular,
            }
        }

        pub fn start(&self) -> Point2 {
            match self {
                Dimension::Linear(dim) | Dimension::Bounding(dim) => dim.start,
                Dimension::Radius(dim) => dim.start,
                Dimension::Angular(dim) => dim.start,
            }
        }

        pub fn end(&self) -> Point2 {
            match self {
                Dimension::Linear(dim) | Dimension::Bounding(dim) => dim.end,
                Dimension::Radius(dim) => dim.end,
                Dimension::Angular(dim) => dim.end,
            }
        }

        /// 文字锚点。角度标注返回顶点而不是起终点的中点。
        pub fn midpoint(&self) -> Point2 {
            match self {
                Dimension::Linear(dim) | Dimension::Bounding(dim) => dim.midpoint,
                Dimension::Radius(dim) => dim.midpoint,
                Dimension::Angular(dim) => dim.vertex,
            }
        }

        pub fn value(&self) -> f64 {
            match self {
                Dimension::Linear(dim) | Dimension::Bounding(dim) => dim.value,
                Dimension::Radius(dim) => dim.value,
                Dimension::Angular(dim) => dim.value,
            }
        }

        pub fn label(&self) -> &str {
            match self {
                Dimension::Linear(dim) | Dimension::Bounding(dim) => &dim.label,
                Dimension::Radius(dim) => &dim.label,
                Dimension::Angular(dim) => &dim.label,
            }
        }

        /// 仅线性与包围盒标注带有法向量。
        pub fn normal(&self) -> Option<Vector2> {
            match self {
                Dimension::Linear(dim) | Dimension::Bounding(dim) => Some(dim.normal),
                _ => None,
            }
        }
    }

    /// 整张图纸的包围盒，派生字段在构造时一次算好。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct BoundingBox {
        pub min: Point2,
        pub max: Point2,
        pub width: f64,
        pub height: f64,
        pub center: Point2,
    }

    impl BoundingBox {
        pub const DEFAULT_EXTENT: f64 = 100.0;

        pub fn from_bounds(bounds: &Bounds2D) -> Self {
            if bounds.is_empty() {
                return Self::default_extent();
            }
            Self {
                min: bounds.min(),
                max: bounds.max(),
                width: bounds.width(),
                height: bounds.height(),
                center: bounds.center(),
            }
        }

        /// 空图纸使用的固定范围 (0,0)-(100,100)。
        pub fn default_extent() -> Self {
            let size = Self::DEFAULT_EXTENT;
            Self {
                min: Point2::new(0.0, 0.0),
                max: Point2::new(size, size),
                width: size,
                height: size,
                center: Point2::new(size * 0.5, size * 0.5),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn circle_bounds_cover_axis_extrema() {
            let circle = Entity::Circle(Circle::new(Point2::new(5.0, 5.0), 2.0));
            let bounds = circle.bounds().expect("circle should have bounds");
            assert!((bounds.min().x() - 3.0).abs() < 1e-9);
            assert!((bounds.min().y() - 3.0).abs() < 1e-9);
            assert!((bounds.max().x() - 7.0).abs() < 1e-9);
            assert!((bounds.max().y() - 7.0).abs() < 1e-9);
        }

        #[test]
        fn closed_polyline_edges_include_closing_pair() {
            let square = Polyline::new(
                [
                    Point2::new(0.0, 0.0),
                    Point2::new(1.0, 0.0),
                    Point2::new(1.0, 1.0),
                ],
                true,
            );
            let edges: Vec<_> = square.edges().collect();
            assert_eq!(edges.len(), 3);
            assert_eq!(edges[2], (Point2::new(1.0, 1.0), Point2::new(0.0, 0.0)));

            let single = Polyline::new([Point2::new(3.0, 3.0)], true);
            assert_eq!(single.edges().count(), 0);

            let open = Polyline::new(square.vertices.clone(), false);
            assert_eq!(open.edges().count(), 2);
        }

        #[test]
        fn dimension_config_toggles_each_kind() {
            let mut config = DimensionConfig::default();
            for kind in DimensionKind::ALL {
                assert!(config.is_enabled(kind));
            }
            config.set(DimensionKind::Angular, false);
            assert!(!config.angular);
            assert!(config.linear && config.radius && config.bounding);
            assert_eq!("Radius".parse::<DimensionKind>(), Ok(DimensionKind::Radius));
            assert!("diameter".parse::<DimensionKind>().is_err());
        }

        #[test]
        fn angular_midpoint_is_vertex() {
            let dim = Dimension::Angular(AngularDimension {
                start: Point2::new(0.0, 0.0),
                end: Point2::new(5.0, 5.0),
                vertex: Point2::new(5.0, 0.0),
                value: 90.0,
                label: "90.0°".to_string(),
            });
            assert_eq!(dim.kind(), DimensionKind::Angular);
            assert_eq!(dim.midpoint(), Point2::new(5.0, 0.0));
            assert!(dim.normal().is_none());
            assert_eq!(dim.label(), "90.0°");
        }

        #[test]
        fn empty_bounds_fall_back_to_default_extent() {
            let bbox = BoundingBox::from_bounds(&Bounds2D::empty());
            assert_eq!(bbox, BoundingBox::default_extent());
            assert!((bbox.width - 100.0).abs() < f64::EPSILON);
            assert!((bbox.center.x() - 50.0).abs() < f64::EPSILON);
        }
    }
}
