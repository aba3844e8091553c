use std::borrow::Cow;
use std::mem;

use autodim_core::document::{Circle, Entity, Line, Polyline};
use autodim_core::geometry::Point2;
use tracing::{debug, trace};

use crate::DecodeError;

const BINARY_SENTINEL: &[u8] = b"AutoCAD Binary DXF";

/// 宽松解码：逐对读取组码，无法识别的记录与不合法的实体被静默丢弃。
pub fn decode(text: &str) -> Vec<Entity> {
    DxfDecoder::new(text).decode()
}

/// 从原始字节解码。只有二进制 DXF 视为结构性错误；非 UTF-8 的行按 Latin-1 逐字节映射。
pub fn decode_bytes(bytes: &[u8]) -> Result<Vec<Entity>, DecodeError> {
    if bytes.starts_with(BINARY_SENTINEL) {
        return Err(DecodeError::BinaryDxf);
    }
    let text = bytes_to_text(bytes);
    Ok(decode(text.strip_prefix('\u{feff}').unwrap_or(&*text)))
}

/// 旧版 R12 文件多以 ANSI 代码页写出，整体不是 UTF-8 时逐行回退。
fn bytes_to_text(bytes: &[u8]) -> Cow<'_, str> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Cow::Borrowed(text);
    }
    let mut text = String::with_capacity(bytes.len());
    for (index, line) in bytes.split(|&b| b == b'\n').enumerate() {
        if index > 0 {
            text.push('\n');
        }
        match std::str::from_utf8(line) {
            Ok(valid) => text.push_str(valid),
            Err(_) => {
                trace!(line = index + 1, "非 UTF-8 行，按 Latin-1 解码");
                text.extend(line.iter().map(|&b| char::from(b)));
            }
        }
    }
    Cow::Owned(text)
}

pub struct DxfDecoder<'a> {
    reader: GroupReader<'a>,
    in_entities: bool,
    state: ParserState,
    entities: Vec<Entity>,
}

impl<'a> DxfDecoder<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            reader: GroupReader::new(source),
            in_entities: false,
            state: ParserState::Idle,
            entities: Vec::new(),
        }
    }

    pub fn decode(mut self) -> Vec<Entity> {
        while let Some(pair) = self.reader.next_pair() {
            if pair.is_marker("SECTION") && self.reader.peek_is(2, "ENTITIES") {
                self.reader.skip_pair();
                self.in_entities = true;
                continue;
            }

            if pair.is_marker("ENDSEC") {
                if self.in_entities {
                    let state = mem::take(&mut self.state);
                    self.commit(state.finish());
                }
                self.in_entities = false;
                continue;
            }

            if !self.in_entities {
                continue;
            }

            let state = mem::take(&mut self.state);
            let Transition { next, committed } = state.on_record(pair);
            self.state = next;
            self.commit(committed);
        }

        let state = mem::take(&mut self.state);
        self.commit(state.finish());
        debug!(entities = self.entities.len(), "DXF 解码完成");
        self.entities
    }

    fn commit(&mut self, entity: Option<Entity>) {
        if let Some(entity) = entity {
            self.entities.push(entity);
        }
    }
}

/// 一条组码/值记录。
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GroupPair<'a> {
    pub code: i32,
    pub value: &'a str,
    pub line: usize,
}

impl GroupPair<'_> {
    #[inline]
    fn is_marker(&self, keyword: &str) -> bool {
        self.code == 0 && self.value == keyword
    }
}

/// 按行切分输入，两行一组产出记录；缺少另一半的记录直接跨过。
struct GroupReader<'a> {
    lines: Vec<&'a str>,
    cursor: usize,
}

impl<'a> GroupReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: split_lines(source),
            cursor: 0,
        }
    }

    fn next_pair(&mut self) -> Option<GroupPair<'a>> {
        while self.cursor < self.lines.len() {
            let line = self.cursor + 1;
            let code = self.lines[self.cursor].trim();
            let value = self.lines.get(self.cursor + 1).map_or("", |raw| raw.trim());
            self.cursor += 2;

            if code.is_empty() || value.is_empty() {
                trace!(line, "跳过不完整的组码对");
                continue;
            }
            let Ok(code) = code.parse::<i32>() else {
                trace!(line, code, "组码不是整数，跳过");
                continue;
            };
            return Some(GroupPair { code, value, line });
        }
        None
    }

    /// 检查紧随其后的两行是否为指定的组码与值，不移动游标。
    fn peek_is(&self, code: i32, value: &str) -> bool {
        let code_line = self.lines.get(self.cursor).map(|raw| raw.trim());
        let value_line = self.lines.get(self.cursor + 1).map(|raw| raw.trim());
        match (code_line, value_line) {
            (Some(raw_code), Some(raw_value)) => {
                raw_code.parse::<i32>() == Ok(code) && raw_value == value
            }
            _ => false,
        }
    }

    fn skip_pair(&mut self) {
        self.cursor += 2;
    }
}

fn split_lines(source: &str) -> Vec<&str> {
    source
        .split("\r\n")
        .flat_map(|chunk| chunk.split(['\r', '\n']))
        .collect()
}

/// 实体段内的解析状态。
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum ParserState {
    #[default]
    Idle,
    BuildingSimple(EntityDraft),
    BuildingLegacyPolyline(LegacyPolylineDraft),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Transition {
    pub next: ParserState,
    pub committed: Option<Entity>,
}

impl Transition {
    fn stay(next: ParserState) -> Self {
        Self {
            next,
            committed: None,
        }
    }
}

impl ParserState {
    pub(crate) fn on_record(self, pair: GroupPair<'_>) -> Transition {
        if pair.code == 0 {
            return self.on_boundary(pair.value, pair.line);
        }
        let mut state = self;
        state.apply_property(pair.code, pair.value, pair.line);
        Transition::stay(state)
    }

    /// 段结束或文件结束时调用：简单实体按有效性提交，未收到 SEQEND 的旧式多段线丢弃。
    pub(crate) fn finish(self) -> Option<Entity> {
        match self {
            ParserState::Idle => None,
            ParserState::BuildingSimple(draft) => draft.build(),
            ParserState::BuildingLegacyPolyline(draft) => {
                trace!(
                    vertices = draft.polyline.vertices.len(),
                    "旧式 POLYLINE 缺少 SEQEND，丢弃"
                );
                None
            }
        }
    }

    fn on_boundary(self, keyword: &str, line: usize) -> Transition {
        match (self, keyword) {
            (ParserState::BuildingLegacyPolyline(mut draft), "VERTEX") => {
                draft.in_vertex = true;
                Transition::stay(ParserState::BuildingLegacyPolyline(draft))
            }
            (ParserState::BuildingLegacyPolyline(draft), "SEQEND") => Transition {
                next: ParserState::Idle,
                committed: draft.polyline.build(),
            },
            (state, keyword) => Transition {
                committed: state.commit(),
                next: ParserState::start(keyword, line),
            },
        }
    }

    fn commit(self) -> Option<Entity> {
        match self {
            ParserState::Idle => None,
            ParserState::BuildingSimple(draft) => draft.build(),
            ParserState::BuildingLegacyPolyline(draft) => draft.polyline.build(),
        }
    }

    fn start(keyword: &str, line: usize) -> ParserState {
        match keyword {
            "LINE" => ParserState::BuildingSimple(EntityDraft::Line(LineDraft::default())),
            "LWPOLYLINE" => {
                ParserState::BuildingSimple(EntityDraft::Polyline(PolylineDraft::default()))
            }
            "CIRCLE" => ParserState::BuildingSimple(EntityDraft::Circle(CircleDraft::default())),
            "POLYLINE" => ParserState::BuildingLegacyPolyline(LegacyPolylineDraft::default()),
            other => {
                trace!(line, keyword = other, "不支持的实体类型，忽略");
                ParserState::Idle
            }
        }
    }

    fn apply_property(&mut self, code: i32, value: &str, line: usize) {
        match self {
            ParserState::Idle => {
                trace!(line, code, "当前没有实体，忽略属性");
            }
            ParserState::BuildingSimple(EntityDraft::Line(draft)) => match code {
                10 => draft.start.x = Some(coordinate(value, code, line)),
                20 => draft.start.y = Some(coordinate(value, code, line)),
                11 => draft.end.x = Some(coordinate(value, code, line)),
                21 => draft.end.y = Some(coordinate(value, code, line)),
                _ => {}
            },
            ParserState::BuildingSimple(EntityDraft::Polyline(draft)) => match code {
                10 => draft.push_x(coordinate(value, code, line)),
                20 => draft.set_last_y(coordinate(value, code, line)),
                70 => draft.is_closed = flags(value) & 0x01 == 0x01,
                _ => {}
            },
            ParserState::BuildingSimple(EntityDraft::Circle(draft)) => match code {
                10 => draft.center.x = Some(coordinate(value, code, line)),
                20 => draft.center.y = Some(coordinate(value, code, line)),
                40 => draft.radius = Some(coordinate(value, code, line)),
                _ => {}
            },
            ParserState::BuildingLegacyPolyline(draft) => {
                if draft.in_vertex {
                    match code {
                        10 => draft.polyline.push_x(coordinate(value, code, line)),
                        20 => draft.polyline.set_last_y(coordinate(value, code, line)),
                        _ => {}
                    }
                } else if code == 70 {
                    // 仅头记录的 70 决定闭合；头记录的 10/20/30 为占位基点，不是顶点。
                    draft.polyline.is_closed = flags(value) & 0x01 == 0x01;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EntityDraft {
    Line(LineDraft),
    Polyline(PolylineDraft),
    Circle(CircleDraft),
}

impl EntityDraft {
    fn build(self) -> Option<Entity> {
        match self {
            EntityDraft::Line(draft) => draft.build(),
            EntityDraft::Polyline(draft) => draft.build(),
            EntityDraft::Circle(draft) => draft.build(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct PointDraft {
    x: Option<f64>,
    y: Option<f64>,
}

impl PointDraft {
    fn resolve(self) -> Option<Point2> {
        Some(Point2::new(self.x?, self.y?))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct LineDraft {
    start: PointDraft,
    end: PointDraft,
}

impl LineDraft {
    fn build(self) -> Option<Entity> {
        match (self.start.resolve(), self.end.resolve()) {
            (Some(start), Some(end)) => Some(Entity::Line(Line::new(start, end))),
            _ => {
                trace!("LINE 缺少起点或终点，丢弃");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PolylineDraft {
    vertices: Vec<Point2>,
    is_closed: bool,
}

impl PolylineDraft {
    fn push_x(&mut self, x: f64) {
        self.vertices.push(Point2::new(x, 0.0));
    }

    /// Y 总是写入最近追加的顶点；尚无顶点时忽略。
    fn set_last_y(&mut self, y: f64) {
        if let Some(last) = self.vertices.last_mut() {
            *last = Point2::new(last.x(), y);
        }
    }

    fn build(self) -> Option<Entity> {
        if self.vertices.is_empty() {
            trace!("多段线没有顶点，丢弃");
            return None;
        }
        Some(Entity::Polyline(Polyline::new(self.vertices, self.is_closed)))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct CircleDraft {
    center: PointDraft,
    radius: Option<f64>,
}

impl CircleDraft {
    fn build(self) -> Option<Entity> {
        match (self.center.resolve(), self.radius) {
            (Some(center), Some(radius)) if radius > 0.0 => {
                Some(Entity::Circle(Circle::new(center, radius)))
            }
            _ => {
                trace!(radius = ?self.radius, "CIRCLE 缺少圆心或半径不为正，丢弃");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct LegacyPolylineDraft {
    polyline: PolylineDraft,
    in_vertex: bool,
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// 坐标解析失败时取 0.0。
fn coordinate(raw: &str, code: i32, line: usize) -> f64 {
    parse_number(raw).unwrap_or_else(|| {
        trace!(line, code, value = raw, "数值解析失败，按 0 处理");
        0.0
    })
}

fn flags(raw: &str) -> i32 {
    raw.trim()
        .parse::<i32>()
        .ok()
        .or_else(|| parse_number(raw).map(|value| value as i32))
        .unwrap_or(0)
}
