use std::collections::HashMap;

use autodim_core::document::DimensionKind;

use crate::errors::EngineError;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub session: &'a mut Session,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(ToggleDimensionCommand);
        bus.register(SetDimensionCommand);
        bus.register(ApplyThemeCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

/// 解析标注类别名称（大小写不敏感）。
pub fn parse_dimension_kind(raw: &str) -> Result<DimensionKind, EngineError> {
    raw.parse::<DimensionKind>()
        .map_err(|_| EngineError::UnknownDimensionKind(raw.to_string()))
}

fn parse_kind(request: &CommandRequest) -> Result<DimensionKind, CommandResponse> {
    let Some(raw) = request.args.first() else {
        return Err(CommandResponse::err(format!(
            "{} 需要标注类别参数",
            request.name
        )));
    };
    parse_dimension_kind(raw).map_err(|err| CommandResponse::err(err.to_string()))
}

struct ToggleDimensionCommand;

impl CommandHandler for ToggleDimensionCommand {
    fn name(&self) -> &'static str {
        "toggle_dimension"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let kind = match parse_kind(request) {
            Ok(kind) => kind,
            Err(response) => return response,
        };
        let enabled = context.session.toggle(kind);
        let state = if enabled { "开启" } else { "关闭" };
        CommandResponse::ok(format!("{kind} 标注已{state}"))
    }
}

/// `set_dimension <kind> <on|off>`，幂等地设置开关。
struct SetDimensionCommand;

impl CommandHandler for SetDimensionCommand {
    fn name(&self) -> &'static str {
        "set_dimension"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let kind = match parse_kind(request) {
            Ok(kind) => kind,
            Err(response) => return response,
        };
        let enabled = match request.args.get(1).map(String::as_str) {
            Some("on") | Some("true") => true,
            Some("off") | Some("false") => false,
            other => {
                return CommandResponse::err(format!(
                    "set_dimension 需要 on/off，收到 {}",
                    other.unwrap_or("<空>")
                ));
            }
        };
        context.session.set_enabled(kind, enabled);
        CommandResponse::ok(format!(
            "{kind} 标注已{}",
            if enabled { "开启" } else { "关闭" }
        ))
    }
}

/// 预设名可能含空格，参数按空格重新拼接。
struct ApplyThemeCommand;

impl CommandHandler for ApplyThemeCommand {
    fn name(&self) -> &'static str {
        "apply_theme"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let name = request.args.join(" ");
        match context.session.select_preset(&name) {
            Ok(()) => CommandResponse::ok(format!("主题已切换为 {name}")),
            Err(err) => CommandResponse::err(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_and_set_commands_update_session() {
        let mut session = Session::new();
        session.populate_demo();

        let bus = CommandBus::new();
        let mut context = CommandContext {
            session: &mut session,
        };

        let toggle = CommandRequest::new("toggle_dimension", ["angular"]);
        let response = bus.dispatch(&toggle, &mut context);
        assert!(response.success);
        assert!(!context.session.config().angular);

        let set = CommandRequest::new("set_dimension", ["Angular", "on"]);
        let response = bus.dispatch(&set, &mut context);
        assert!(response.success);
        assert!(context.session.config().angular);

        let response = bus.dispatch(&set, &mut context);
        assert!(response.success);
        assert!(context.session.config().angular);
    }

    #[test]
    fn invalid_arguments_are_reported() {
        let mut session = Session::new();
        let bus = CommandBus::new();
        let mut context = CommandContext {
            session: &mut session,
        };

        let missing = CommandRequest::new("toggle_dimension", Vec::<String>::new());
        assert!(!bus.dispatch(&missing, &mut context).success);

        let unknown = CommandRequest::new("toggle_dimension", ["diameter"]);
        let response = bus.dispatch(&unknown, &mut context);
        assert!(!response.success);
        assert_eq!(
            response.message.as_deref(),
            Some("unknown dimension category: diameter")
        );

        let bad_state = CommandRequest::new("set_dimension", ["radius", "maybe"]);
        assert!(!bus.dispatch(&bad_state, &mut context).success);
        assert!(context.session.config().radius);

        let unknown_command = CommandRequest::new("focus_selection", Vec::<String>::new());
        let response = bus.dispatch(&unknown_command, &mut context);
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("未知命令: focus_selection"));
    }

    #[test]
    fn dimension_kind_names_are_case_insensitive() {
        assert_eq!(
            parse_dimension_kind("RADIUS").unwrap(),
            DimensionKind::Radius
        );
        let err = parse_dimension_kind("chamfer").unwrap_err();
        assert!(matches!(err, EngineError::UnknownDimensionKind(name) if name == "chamfer"));
    }

    #[test]
    fn apply_theme_joins_multi_word_names() {
        let mut session = Session::new();
        let bus = CommandBus::new();
        let mut context = CommandContext {
            session: &mut session,
        };

        let request = CommandRequest::new("apply_theme", ["Neon", "Nights"]);
        assert!(bus.dispatch(&request, &mut context).success);
        assert_eq!(context.session.theme_name(), "Neon Nights");
        assert_eq!(context.session.theme().background, "#2e0225");

        let request = CommandRequest::new("apply_theme", ["Sepia"]);
        assert!(!bus.dispatch(&request, &mut context).success);
        assert_eq!(context.session.theme_name(), "Neon Nights");
    }
}
