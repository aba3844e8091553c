use autodim_core::document::{Dimension, Entity, LinearDimension};
use autodim_core::geometry::{Point2, Vector2};
use tracing::debug;

/// 输出固定为 R12 方言。
pub const ACAD_VERSION: &str = "AC1009";
pub const DEFAULT_LAYER: &str = "0";
pub const DIMENSION_LAYER: &str = "DIMENSIONS";

const DIMENSION_OFFSET: f64 = 2.0;
const TEXT_HEIGHT: f64 = 1.0;
const LINEAR_COLOR: i32 = 3;
const RADIUS_COLOR: i32 = 1;

/// 将原始实体与标注写成 R12 DXF 文本。
pub fn encode(entities: &[Entity], dimensions: &[Dimension]) -> String {
    DxfEncoder::new().encode(entities, dimensions)
}

/// 逐条追加组码/值的 ASCII 写出器，组码不做对齐填充。
#[derive(Debug, Default)]
pub struct DxfEncoder {
    out: String,
}

impl DxfEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(mut self, entities: &[Entity], dimensions: &[Dimension]) -> String {
        self.write_header();
        self.write_tables();

        self.begin_section("ENTITIES");
        for entity in entities {
            self.write_entity(entity);
        }
        for dimension in dimensions {
            self.write_dimension(dimension);
        }
        self.end_section();
        self.text(0, "EOF");

        debug!(
            entities = entities.len(),
            dimensions = dimensions.len(),
            bytes = self.out.len(),
            "DXF 编码完成"
        );
        self.out
    }

    fn write_header(&mut self) {
        self.begin_section("HEADER");
        self.text(9, "$ACADVER");
        self.text(1, ACAD_VERSION);
        for (name, x, y) in [
            ("$INSBASE", "0.0", "0.0"),
            ("$EXTMIN", "0.0", "0.0"),
            ("$EXTMAX", "1000.0", "1000.0"),
        ] {
            self.text(9, name);
            self.text(10, x);
            self.text(20, y);
            self.text(30, "0.0");
        }
        self.end_section();
    }

    fn write_tables(&mut self) {
        self.begin_section("TABLES");

        self.text(0, "TABLE");
        self.text(2, "LTYPE");
        self.int(70, 1);
        self.text(0, "LTYPE");
        self.text(2, "CONTINUOUS");
        self.int(70, 64);
        self.text(3, "Solid line");
        self.int(72, 65);
        self.int(73, 0);
        self.text(40, "0.0");
        self.text(0, "ENDTAB");

        self.text(0, "TABLE");
        self.text(2, "LAYER");
        self.int(70, 6);
        for (name, color) in [(DEFAULT_LAYER, 7), (DIMENSION_LAYER, LINEAR_COLOR)] {
            self.text(0, "LAYER");
            self.text(2, name);
            self.int(70, 0);
            self.int(62, color);
            self.text(6, "CONTINUOUS");
        }
        self.text(0, "ENDTAB");

        self.end_section();
    }

    fn write_entity(&mut self, entity: &Entity) {
        match entity {
            Entity::Line(line) => self.line(line.start, line.end, DEFAULT_LAYER, None),
            Entity::Circle(circle) => {
                self.text(0, "CIRCLE");
                self.text(8, DEFAULT_LAYER);
                self.point(circle.center);
                self.number(40, circle.radius);
            }
            Entity::Polyline(polyline) => {
                // R12 没有 LWPOLYLINE，降级为 POLYLINE/VERTEX/SEQEND。
                self.text(0, "POLYLINE");
                self.text(8, DEFAULT_LAYER);
                self.int(66, 1);
                self.int(70, i32::from(polyline.is_closed));
                self.text(10, "0.0");
                self.text(20, "0.0");
                self.text(30, "0.0");
                for vertex in &polyline.vertices {
                    self.text(0, "VERTEX");
                    self.text(8, DEFAULT_LAYER);
                    self.point(*vertex);
                }
                self.text(0, "SEQEND");
                self.text(8, DEFAULT_LAYER);
            }
        }
    }

    fn write_dimension(&mut self, dimension: &Dimension) {
        match dimension {
            Dimension::Linear(dim) | Dimension::Bounding(dim) => self.write_offset_dimension(dim),
            Dimension::Radius(dim) => {
                self.line(dim.start, dim.end, DIMENSION_LAYER, Some(RADIUS_COLOR));
                let anchor = dim.midpoint.translate(Vector2::new(0.0, 1.0));
                self.label(anchor, &dim.label, 0.0);
            }
            Dimension::Angular(dim) => self.label(dim.vertex, &dim.label, 0.0),
        }
    }

    fn write_offset_dimension(&mut self, dim: &LinearDimension) {
        let normal = dim.normal;
        let offset = normal.scale(DIMENSION_OFFSET);
        let p1 = dim.start.translate(offset);
        let p2 = dim.end.translate(offset);

        self.line(p1, p2, DIMENSION_LAYER, Some(LINEAR_COLOR));
        self.line(dim.start, p1, DIMENSION_LAYER, Some(LINEAR_COLOR));
        self.line(dim.end, p2, DIMENSION_LAYER, Some(LINEAR_COLOR));

        let anchor = p1.midpoint(p2).translate(normal);
        self.label(anchor, &dim.label, label_rotation(p1, p2));
    }

    fn line(&mut self, start: Point2, end: Point2, layer: &str, color: Option<i32>) {
        self.text(0, "LINE");
        self.text(8, layer);
        if let Some(color) = color {
            self.int(62, color);
        }
        self.number(10, start.x());
        self.number(20, start.y());
        self.text(30, "0.0");
        self.number(11, end.x());
        self.number(21, end.y());
        self.text(31, "0.0");
    }

    fn label(&mut self, position: Point2, label: &str, rotation: f64) {
        self.text(0, "TEXT");
        self.text(8, DIMENSION_LAYER);
        self.number(10, position.x());
        self.number(20, position.y());
        self.text(30, "0.0");
        self.number(40, TEXT_HEIGHT);
        self.text(1, label);
        self.number(50, rotation);
    }

    fn point(&mut self, point: Point2) {
        self.number(10, point.x());
        self.number(20, point.y());
        self.number(30, 0.0);
    }

    fn begin_section(&mut self, name: &str) {
        self.text(0, "SECTION");
        self.text(2, name);
    }

    fn end_section(&mut self) {
        self.text(0, "ENDSEC");
    }

    fn text(&mut self, code: i32, value: &str) {
        self.out.push_str(&code.to_string());
        self.out.push('\n');
        self.out.push_str(value);
        self.out.push('\n');
    }

    fn int(&mut self, code: i32, value: i32) {
        self.text(code, &value.to_string());
    }

    fn number(&mut self, code: i32, value: f64) {
        self.text(code, &format_number(value));
    }
}

/// 最短往返十进制表示，整数不带小数点，负零写作 0。
pub(crate) fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{value}")
    }
}

/// 文字旋转角（度），归一化到 (-90, 90]，避免文字倒置。
pub(crate) fn label_rotation(start: Point2, end: Point2) -> f64 {
    let angle = start.vector_to(end).angle().to_degrees();
    if angle > 90.0 {
        angle - 180.0
    } else if angle <= -90.0 {
        angle + 180.0
    } else {
        angle
    }
}
