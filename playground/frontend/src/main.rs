use lox_playground::platform::browser;
use lox_playground::zoon::{eprintln, map_ref, *};
use lox_playground::{LineKind, LogLine, PlaygroundConfig, PlaygroundSession};

const APP_BACKGROUND_GRADIENT: &str =
    "linear-gradient(155deg, #231746 0%, #141f33 48%, #0d323f 100%)";

fn shell_surface_color() -> Rgba {
    color!("rgba(13, 18, 30, 0.76)")
}

fn primary_surface_color() -> Rgba {
    color!("rgba(21, 27, 44, 0.92)")
}

fn primary_text_color() -> Rgba {
    color!("#f1f4ff")
}

fn muted_text_color() -> Rgba {
    color!("rgba(226, 232, 255, 0.7)")
}

fn main() {
    start_app("app", Playground::new);
}

#[derive(Clone)]
struct Playground {
    session: PlaygroundSession,
}

impl Playground {
    fn new() -> impl Element {
        let session = browser::start(&PlaygroundConfig::default());
        if let Err(error) = browser::install_automation_api(&session) {
            eprintln!("Failed to install window.loxPlayground: {error:?}");
        }
        Self { session }.root()
    }

    /// Callers check readiness first, the Run control is disabled until then.
    fn run(&self) {
        if let Err(error) = self.session.run_code() {
            eprintln!("{error}");
        }
    }

    fn root(&self) -> impl Element + use<> {
        Column::new()
            .s(Width::fill())
            .s(Height::fill())
            .s(Padding::new().x(6).top(8).bottom(10))
            .s(Gap::new().y(8))
            .s(Font::new().color(primary_text_color()))
            .update_raw_el(|raw_el| raw_el.style("background", APP_BACKGROUND_GRADIENT))
            .update_raw_el({
                let this = self.clone();
                move |raw_el| {
                    raw_el.global_event_handler_with_options(
                        EventOptions::new().preventable().parents_first(),
                        move |event: events::KeyDown| {
                            if event.repeat() {
                                return;
                            }
                            if event.shift_key() && event.key() == "Enter" {
                                event.prevent_default();
                                // Same gate as the disabled Run button
                                if this.session.is_ready() {
                                    this.run();
                                }
                            }
                        },
                    )
                }
            })
            .item(self.header_bar())
            .item(self.panels_row())
    }

    fn header_bar(&self) -> impl Element + use<> {
        Row::new()
            .s(Width::fill())
            .s(Align::new().center_y())
            .s(Gap::new().x(12).y(8))
            .s(Padding::new().x(18).y(12))
            .s(Background::new().color(shell_surface_color()))
            .s(RoundedCorners::all(28))
            .multiline()
            .item(
                El::new()
                    .s(Font::new()
                        .size(18)
                        .weight(FontWeight::SemiBold)
                        .family([FontFamily::new("JetBrains Mono"), FontFamily::Monospace])
                        .color(color!("#fcbf49"))
                        .no_wrap())
                    .child("lox / play"),
            )
            .item(self.status_line())
            .item(
                Row::new()
                    .s(Align::new().right())
                    .s(Gap::new().x(10))
                    .item(self.run_button())
                    .item(self.secondary_button("Clear", {
                        let session = self.session.clone();
                        move || session.clear_log()
                    }))
                    .item(self.secondary_button("Reset code", {
                        let session = self.session.clone();
                        move || session.reset_code()
                    })),
            )
    }

    fn status_line(&self) -> impl Element + use<> {
        let bridge = self.session.bridge().clone();
        El::new()
            .s(Font::new().size(13).color(muted_text_color()).no_wrap())
            .child_signal(map_ref! {
                let ready = bridge.ready_signal(),
                let load_error = bridge.load_error_signal() =>
                match (*ready, load_error) {
                    (true, _) => "Interpreter ready".to_owned(),
                    (false, Some(error)) => format!("Interpreter unavailable: {error}"),
                    (false, None) => "Loading interpreter...".to_owned(),
                }
            })
    }

    fn run_button(&self) -> impl Element + use<> {
        let hovered = Mutable::new(false);
        let session = self.session.clone();
        Button::new()
            .s(Padding::new().x(14).y(7))
            .s(RoundedCorners::all(22))
            .s(Font::new().color(color!("#052039")).weight(FontWeight::SemiBold))
            .s(Background::new().color_signal(map_ref! {
                let hovered = hovered.signal(),
                let disabled = session.run_disabled_signal() =>
                match (*disabled, *hovered) {
                    (true, _) => color!("rgba(108, 162, 255, 0.3)"),
                    (false, true) => color!("rgba(140, 196, 255, 0.9)"),
                    (false, false) => color!("rgba(108, 162, 255, 0.75)"),
                }
            }))
            .update_raw_el(|raw_el| {
                raw_el
                    .attr_signal(
                        "disabled",
                        session.run_disabled_signal().map(|disabled| disabled.then_some("")),
                    )
                    .attr_signal(
                        "aria-disabled",
                        session.run_disabled_signal().map(|disabled| disabled.then_some("true")),
                    )
                    .style_signal(
                        "pointer-events",
                        session.run_disabled_signal().map(|disabled| disabled.then_some("none")),
                    )
            })
            .label(
                Row::new()
                    .s(Align::new().center_y())
                    .s(Gap::new().x(6))
                    .item(
                        El::new()
                            .s(Font::new().size(14).weight(FontWeight::SemiBold).no_wrap())
                            .child("Run"),
                    )
                    .item(
                        El::new()
                            .s(Font::new().size(13).color(color!("rgba(5, 32, 57, 0.78)")).no_wrap())
                            .child("Shift + Enter"),
                    ),
            )
            .on_hovered_change(move |is_hovered| hovered.set(is_hovered))
            .on_press({
                let this = self.clone();
                // Keyboard activation of a focused button
                move || {
                    if this.session.is_ready() {
                        this.run();
                    }
                }
            })
    }

    fn secondary_button(
        &self,
        label: &'static str,
        on_press: impl FnMut() + 'static,
    ) -> impl Element + use<> {
        let hovered = Mutable::new(false);
        Button::new()
            .s(Padding::new().x(12).y(7))
            .s(RoundedCorners::all(22))
            .s(Borders::all(
                Border::new()
                    .color(color!("rgba(255, 255, 255, 0.12)"))
                    .width(1),
            ))
            .s(Background::new().color_signal(
                hovered
                    .signal()
                    .map_bool(|| color!("rgba(36, 48, 72, 0.44)"), || color!("rgba(26, 36, 58, 0.32)")),
            ))
            .s(Font::new().size(14).weight(FontWeight::Medium).no_wrap())
            .label(label)
            .on_hovered_change(move |is_hovered| hovered.set(is_hovered))
            .on_press(on_press)
    }

    fn panels_row(&self) -> impl Element + use<> {
        Row::new()
            .s(Width::fill())
            .s(Height::fill())
            .s(Align::new().top())
            .s(Gap::new().x(10))
            .item(primary_panel(self.code_editor()))
            .item(primary_panel(self.log_panel()))
    }

    fn code_editor(&self) -> impl Element + use<> {
        use wasm_bindgen::JsCast;

        let code = self.session.code().clone();
        let textarea = RawHtmlEl::new("textarea");
        let dom_element = textarea.dom_element();
        textarea
            .attr("spellcheck", "false")
            .style("width", "100%")
            .style("height", "100%")
            .style("resize", "none")
            .style("border", "none")
            .style("outline", "none")
            .style("padding", "14px")
            .style("background", "#0b1223")
            .style("color", "#f1f4ff")
            .style("font-family", "'JetBrains Mono', monospace")
            .style("font-size", "14px")
            .prop_signal("value", code.code_signal().map(|text| text.to_string()))
            .event_handler(move |_: events::Input| {
                if let Some(textarea) = dom_element.dyn_ref::<web_sys::HtmlTextAreaElement>() {
                    code.set_code(textarea.value());
                }
            })
    }

    fn log_panel(&self) -> impl Element + use<> {
        Column::new()
            .s(Width::fill())
            .s(Height::fill())
            .s(Align::new().top())
            .s(Padding::all(14))
            .s(Scrollbars::both())
            .s(Font::new()
                .size(14)
                .family([FontFamily::new("JetBrains Mono"), FontFamily::Monospace]))
            .items_signal_vec(
                self.session
                    .log()
                    .lines_signal_vec()
                    .map(|line| log_row(LogLine::from(line))),
            )
    }
}

fn primary_panel(content: impl Element) -> impl Element {
    El::new()
        .s(Width::fill())
        .s(Height::fill())
        .s(Scrollbars::both())
        .s(Background::new().color(primary_surface_color()))
        .s(RoundedCorners::all(24))
        .s(Clip::both())
        .s(Borders::all(
            Border::new().color(color!("rgba(255, 255, 255, 0.05)")).width(1),
        ))
        .child(content)
}

fn log_row(line: LogLine) -> impl Element {
    let color = match line.kind {
        LineKind::Output => primary_text_color(),
        LineKind::Error => color!("LightCoral"),
        LineKind::Progress => muted_text_color(),
    };
    El::new()
        .s(Font::new().color(color))
        .update_raw_el(|raw_el| raw_el.style("white-space", "pre-wrap"))
        .child(line.text)
}
