use std::fmt::Write as _;

use autodim_core::document::Dimension;
use autodim_core::geometry::Point2;
use autodim_engine::command::{CommandBus, CommandContext, CommandRequest};
use autodim_engine::session::Session;
use autodim_io::{DrawingSaver, DxfFacade, IoError};
use tracing::{info, warn};

use crate::CliOptions;
use crate::errors::FrontendError;
use crate::loader::{DrawingSource, load_session};

/// 加载图纸、按配置生成标注、打印概览并写出带标注的 DXF。
pub fn run(options: &CliOptions) -> Result<(), FrontendError> {
    let loaded = load_session(options.input.as_deref(), options.dimensions)?;
    let mut session = loaded.session;

    let command_bus = CommandBus::new();
    let mut context = CommandContext {
        session: &mut session,
    };
    let theme_args: Vec<&str> = options.theme.split_whitespace().collect();
    if let Err(err) =
        dispatch_cli_command(&command_bus, "apply_theme", &theme_args, &mut context)
    {
        warn!("CLI 命令执行失败: {err}");
    }

    print!("{}", render_report(&session, &loaded.source));

    save_output(&session, options)?;
    println!("已写出：{}", options.output.display());
    Ok(())
}

fn save_output(session: &Session, options: &CliOptions) -> Result<(), FrontendError> {
    match DxfFacade::new().save(session.entities(), session.dimensions(), &options.output) {
        Ok(()) => {
            info!(path = %options.output.display(), "标注结果已写出");
            Ok(())
        }
        Err(IoError::EmptyDrawing) => Err(FrontendError::EmptyDrawing),
        Err(err) => Err(err.into()),
    }
}

/// 生成会话概览文本：来源、图元统计、包围盒与逐条标注。
pub fn render_report(session: &Session, source: &DrawingSource) -> String {
    let mut out = String::new();
    let summary = session.summary();
    let bbox = session.bounding_box();
    let config = session.config();

    let _ = writeln!(out, "AutoDim CLI");
    match source {
        DrawingSource::Dxf(path) => {
            let _ = writeln!(out, "已从 DXF 加载图纸：{}", path.display());
        }
        DrawingSource::Demo => {
            let _ = writeln!(out, "使用内置示例图纸");
        }
    }
    let _ = writeln!(
        out,
        "图元：线段 {}，多段线 {}，圆 {}",
        summary.lines, summary.polylines, summary.circles
    );
    let _ = writeln!(
        out,
        "包围盒：{} - {}，宽 {:.2}，高 {:.2}",
        format_point(bbox.min),
        format_point(bbox.max),
        bbox.width,
        bbox.height
    );
    let _ = writeln!(
        out,
        "标注开关：linear={} bounding={} angular={} radius={}",
        config.linear, config.bounding, config.angular, config.radius
    );
    let _ = writeln!(out, "主题：{}", session.theme_name());
    for (key, value) in session.theme().colors() {
        let _ = writeln!(out, "  - {key}: {value}");
    }

    let _ = writeln!(out, "标注（{} 条）：", session.dimensions().len());
    for dimension in session.dimensions() {
        let _ = writeln!(out, "  - {}", describe_dimension(dimension));
    }
    out
}

fn describe_dimension(dimension: &Dimension) -> String {
    match dimension {
        Dimension::Angular(dim) => format!(
            "angular {} 顶点={}",
            dim.label,
            format_point(dim.vertex)
        ),
        other => format!(
            "{} {} {} -> {}",
            other.kind(),
            other.label(),
            format_point(other.start()),
            format_point(other.end())
        ),
    }
}

fn dispatch_cli_command(
    bus: &CommandBus,
    name: &str,
    args: &[&str],
    context: &mut CommandContext<'_>,
) -> Result<(), String> {
    let request = CommandRequest::new(name, args.iter().copied());
    let response = bus.dispatch(&request, context);
    if response.success {
        if let Some(message) = response.message {
            println!("[命令] {message}");
        }
        Ok(())
    } else {
        Err(response.message.unwrap_or_else(|| "未知错误".to_string()))
    }
}

fn format_point(point: Point2) -> String {
    format!("({:.2}, {:.2})", point.x(), point.y())
}

#[cfg(test)]
mod tests {
    use super::*;
    use autodim_core::document::DimensionConfig;
    use autodim_io::{DrawingLoader, encode};

    fn options(dir: &std::path::Path) -> CliOptions {
        CliOptions {
            input: None,
            output: dir.join("autodimensioned.dxf"),
            dimensions: DimensionConfig::default(),
            theme: "Deep Ocean".to_string(),
        }
    }

    #[test]
    fn report_lists_every_dimension() {
        let mut session = Session::new();
        session.populate_demo();
        let report = render_report(&session, &DrawingSource::Demo);

        assert!(report.contains("使用内置示例图纸"));
        assert!(report.contains("图元：线段 2，多段线 1，圆 1"));
        assert!(report.contains("标注（12 条）："));
        assert!(report.contains("radius R12.50"));
        assert!(report.contains("angular 90.0° 顶点=(100.00, 0.00)"));
        assert!(report.contains("bounding W: 100.00"));
    }

    #[test]
    fn run_writes_annotated_demo() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let options = CliOptions {
            input: Some(dir.path().join("input.dxf")),
            ..options(dir.path())
        };
        let mut demo = Session::new();
        demo.populate_demo();
        std::fs::write(
            options.input.as_ref().expect("input path"),
            encode(demo.entities(), &[]),
        )
        .expect("write input");

        run(&options).expect("run cli");

        // 标注线也以 LINE 写出，重新读取时排在原始图元之后。
        let written = DxfFacade::new().load(&options.output).expect("reload output");
        assert_eq!(&written[..4], demo.entities());
        // 6 条线性 x3、2 条包围盒 x3、1 条半径引线
        assert_eq!(written.len(), 4 + 18 + 6 + 1);
    }

    #[test]
    fn empty_input_is_not_written() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let options = CliOptions {
            input: Some(dir.path().join("empty.dxf")),
            ..options(dir.path())
        };
        std::fs::write(
            options.input.as_ref().expect("input path"),
            "0\nSECTION\n2\nENTITIES\n0\nENDSEC\n0\nEOF\n",
        )
        .expect("write input");

        let err = run(&options).expect_err("empty drawing must not be saved");
        assert!(matches!(err, FrontendError::EmptyDrawing));
        assert!(!options.output.exists());
    }
}
