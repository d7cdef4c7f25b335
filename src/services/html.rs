//! Generated HTML pages: text notices and deadline countdowns.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

use crate::entities::html_players;

pub const DEFAULT_TITLE: &str = "Aviso";
pub const DEFAULT_BODY_HTML: &str = "<p>Escreva sua mensagem…</p>";
pub const DEFAULT_BG_COLOR: &str = "#000000";
pub const DEFAULT_TEXT_COLOR: &str = "#ffffff";
pub const DEFAULT_ACCENT_COLOR: &str = "#22c55e";
pub const DEFAULT_FONT_FAMILY: &str = r#"system-ui, -apple-system, "Segoe UI", Roboto, "Helvetica Neue", Arial, "Noto Sans", sans-serif"#;
pub const DEFAULT_FONT_SIZE_PX: i32 = 48;
pub const DEFAULT_TEXT_ALIGN: &str = "center";
pub const DEFAULT_PADDING_PX: i32 = 24;
pub const DEFAULT_MAX_WIDTH_PX: i32 = 1200;

const TEXT_ALIGNS: &[&str] = &["left", "center", "right", "justify"];

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<script[\s\S]*?>[\s\S]*?</script>").expect("valid regex"));
static HANDLER_DOUBLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\son\w+="[^"]*""#).expect("valid regex"));
static HANDLER_SINGLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\son\w+='[^']*'").expect("valid regex"));
static HANDLER_UNQUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\son\w+=[^\s>]+").expect("valid regex"));
static COUNTDOWN_CFG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<script id="CFG" type="application/json">([\s\S]*?)</script>"#)
        .expect("valid regex")
});

/// Stored `bodyHtml` prefix that marks an `HtmlPlayer` as a countdown.
pub const COUNTDOWN_BODY_PREFIX: &str = "Countdown to ";

/// Strips `<script>` blocks and inline `on*=` event handlers.
///
/// This is pattern matching, not an HTML parser. It keeps operator-authored
/// markup intact and only removes the obvious script vectors.
#[must_use]
pub fn sanitize_user_html(input: &str) -> String {
    let out = SCRIPT_BLOCK.replace_all(input, "");
    let out = HANDLER_DOUBLE_QUOTED.replace_all(&out, "");
    let out = HANDLER_SINGLE_QUOTED.replace_all(&out, "");
    HANDLER_UNQUOTED.replace_all(&out, "").into_owned()
}

/// Lowercased alignment if it is one of the CSS keywords we allow.
#[must_use]
pub fn normalize_align(value: &str) -> &'static str {
    let lower = value.trim().to_ascii_lowercase();
    TEXT_ALIGNS
        .iter()
        .find(|a| **a == lower)
        .copied()
        .unwrap_or(DEFAULT_TEXT_ALIGN)
}

/// Reads a pixel value sent either as a JSON number or a numeric string.
/// Missing, non-numeric and zero values yield `None`.
#[must_use]
pub fn coerce_px(value: Option<&Value>) -> Option<i32> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !number.is_finite() || number == 0.0 {
        return None;
    }

    #[allow(clippy::cast_possible_truncation)]
    Some(number.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Visual fields accepted by the notice endpoints. Every field is optional;
/// pixel sizes may be numbers or strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeFields {
    pub title: Option<String>,
    pub body_html: Option<String>,
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub font_family: Option<String>,
    pub font_size_px: Option<Value>,
    pub text_align: Option<String>,
    pub padding_px: Option<Value>,
    pub max_width_px: Option<Value>,
}

impl NoticeFields {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body_html.is_none()
            && self.bg_color.is_none()
            && self.text_color.is_none()
            && self.font_family.is_none()
            && self.font_size_px.is_none()
            && self.text_align.is_none()
            && self.padding_px.is_none()
            && self.max_width_px.is_none()
    }
}

/// Fully resolved notice style, as stored on an `HtmlPlayer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeStyle {
    pub title: String,
    pub body_html: String,
    pub bg_color: String,
    pub text_color: String,
    pub font_family: String,
    pub font_size_px: i32,
    pub text_align: String,
    pub padding_px: i32,
    pub max_width_px: i32,
}

impl Default for NoticeStyle {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            body_html: DEFAULT_BODY_HTML.to_string(),
            bg_color: DEFAULT_BG_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size_px: DEFAULT_FONT_SIZE_PX,
            text_align: DEFAULT_TEXT_ALIGN.to_string(),
            padding_px: DEFAULT_PADDING_PX,
            max_width_px: DEFAULT_MAX_WIDTH_PX,
        }
    }
}

impl NoticeStyle {
    #[must_use]
    pub fn from_fields(fields: &NoticeFields) -> Self {
        let mut style = Self::default();
        style.apply(fields);
        style
    }

    #[must_use]
    pub fn from_model(model: &html_players::Model) -> Self {
        Self {
            title: model.title.clone(),
            body_html: model.body_html.clone(),
            bg_color: model.bg_color.clone(),
            text_color: model.text_color.clone(),
            font_family: model.font_family.clone(),
            font_size_px: model.font_size_px,
            text_align: model.text_align.clone(),
            padding_px: model.padding_px,
            max_width_px: model.max_width_px,
        }
    }

    /// Overlays the provided fields. Empty strings and unusable numbers keep
    /// the current value; the body is sanitized on the way in.
    pub fn apply(&mut self, fields: &NoticeFields) {
        if let Some(v) = non_empty(fields.title.as_deref()) {
            self.title = v.to_string();
        }
        if let Some(v) = fields.body_html.as_deref() {
            self.body_html = sanitize_user_html(v);
        }
        if let Some(v) = non_empty(fields.bg_color.as_deref()) {
            self.bg_color = v.to_string();
        }
        if let Some(v) = non_empty(fields.text_color.as_deref()) {
            self.text_color = v.to_string();
        }
        if let Some(v) = non_empty(fields.font_family.as_deref()) {
            self.font_family = v.to_string();
        }
        if let Some(v) = coerce_px(fields.font_size_px.as_ref()) {
            self.font_size_px = v;
        }
        if let Some(v) = fields.text_align.as_deref() {
            self.text_align = normalize_align(v).to_string();
        }
        if let Some(v) = coerce_px(fields.padding_px.as_ref()) {
            self.padding_px = v;
        }
        if let Some(v) = coerce_px(fields.max_width_px.as_ref()) {
            self.max_width_px = v;
        }
    }

    /// Copies the style onto a row, leaving identity and schedule alone.
    pub fn write_to(&self, model: &mut html_players::Model) {
        model.title.clone_from(&self.title);
        model.body_html.clone_from(&self.body_html);
        model.bg_color.clone_from(&self.bg_color);
        model.text_color.clone_from(&self.text_color);
        model.font_family.clone_from(&self.font_family);
        model.font_size_px = self.font_size_px;
        model.text_align.clone_from(&self.text_align);
        model.padding_px = self.padding_px;
        model.max_width_px = self.max_width_px;
    }
}

/// Full standalone page for a text notice.
#[must_use]
pub fn render_notice(style: &NoticeStyle) -> String {
    let title = html_escape::encode_text(&style.title);
    let body = sanitize_user_html(&style.body_html);
    let align = normalize_align(&style.text_align);
    let max_width = positive_or(style.max_width_px, DEFAULT_MAX_WIDTH_PX);
    let padding = positive_or(style.padding_px, DEFAULT_PADDING_PX);
    let font_size = positive_or(style.font_size_px, DEFAULT_FONT_SIZE_PX);

    format!(
        r#"<!doctype html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1"/>
<title>{title}</title>
<style>
  html,body{{height:100%}}
  body{{
    margin:0;
    background:{bg};
    color:{fg};
    font-family:{font};
    display:flex;
    align-items:center;
    justify-content:center;
  }}
  .wrap{{
    box-sizing:border-box;
    max-width:{max_width}px;
    width:100%;
    padding:{padding}px;
    font-size:{font_size}px;
    line-height:1.25;
    text-align:{align};
    word-wrap:break-word;
    overflow-wrap:break-word;
  }}
  * {{ cursor:none !important; }}
</style>
</head>
<body>
  <div class="wrap">
    {body}
  </div>
</body>
</html>"#,
        bg = style.bg_color,
        fg = style.text_color,
        font = style.font_family,
    )
}

const fn positive_or(value: i32, default: i32) -> i32 {
    if value == 0 { default } else { value }
}

/// Settings embedded in a countdown page and read back by its script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownConfig {
    pub title: String,
    #[serde(rename = "deadlineISO")]
    pub deadline_iso: String,
    pub bg_color: String,
    pub text_color: String,
    pub accent_color: String,
    pub font_family: String,
}

impl CountdownConfig {
    #[must_use]
    pub fn new(title: impl Into<String>, deadline_iso: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            deadline_iso: deadline_iso.into(),
            bg_color: DEFAULT_BG_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }

    /// Countdown settings for a stored row, `None` for plain notices.
    /// The accent colour is not persisted and falls back to the default.
    #[must_use]
    pub fn from_model(model: &html_players::Model) -> Option<Self> {
        let deadline = model.body_html.strip_prefix(COUNTDOWN_BODY_PREFIX)?;
        Some(Self {
            bg_color: model.bg_color.clone(),
            text_color: model.text_color.clone(),
            font_family: model.font_family.clone(),
            ..Self::new(model.title.clone(), deadline)
        })
    }

    /// Reads the config back out of a page produced by [`render_countdown`].
    #[must_use]
    pub fn from_page(page: &str) -> Option<Self> {
        let json = COUNTDOWN_CFG.captures(page)?.get(1)?.as_str();
        serde_json::from_str(json).ok()
    }

    #[must_use]
    pub fn body_placeholder(&self) -> String {
        format!("{COUNTDOWN_BODY_PREFIX}{}", self.deadline_iso)
    }

    /// JSON for the inline `<script type="application/json">` block.
    /// `<` is escaped so the payload cannot close the script element.
    pub fn to_embedded_json(&self) -> Result<String, serde_json::Error> {
        Ok(serde_json::to_string(self)?.replace('<', "\\u003c"))
    }
}

/// Countdown page that ticks down to `deadlineISO` in the browser.
pub fn render_countdown(config: &CountdownConfig) -> Result<String, serde_json::Error> {
    let config_json = config.to_embedded_json()?;
    let title = html_escape::encode_text(&config.title);

    Ok(format!(
        r#"<!doctype html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1"/>
<title>{title}</title>
<style>
  :root{{--bg:{bg};--fg:{fg};--accent:{accent}}}
  html,body{{height:100%}}
  body{{margin:0;background:var(--bg);color:var(--fg);font-family:{font};display:flex;align-items:center;justify-content:center}}
  .wrap{{box-sizing:border-box;width:100%;max-width:1200px;padding:24px;text-align:center}}
  h1{{margin:0 0 12px;font-size:80px;letter-spacing:.3px}}
  .when{{opacity:.85;margin-bottom:20px;font-size:clamp(14px,2.4vw,18px)}}
  .clock{{display:flex;gap:14px;justify-content:center;align-items:stretch;flex-wrap:wrap}}
  .block{{background:rgba(255,255,255,.06);border:1px solid rgba(255,255,255,.1);border-radius:14px;min-width:120px;padding:16px 10px}}
  .num{{font-variant-numeric:tabular-nums;font-size:clamp(34px,9vw,84px);font-weight:800;line-height:1;color:var(--accent);text-shadow:0 2px 14px rgba(34,197,94,.25)}}
  .lab{{margin-top:8px;font-size:clamp(12px,2.2vw,16px);opacity:.85}}
  .done{{margin-top:14px;font-weight:700;color:var(--accent);font-size:clamp(16px,3.6vw,22px)}}
  *{{cursor:none!important}}
</style>
</head>
<body>
  <div class="wrap">
    <h1 id="t"></h1>
    <div class="when" id="w"></div>
    <div class="clock" id="c" hidden>
      <div class="block"><div class="num" id="d">0</div><div class="lab">dias</div></div>
      <div class="block"><div class="num" id="h">00</div><div class="lab">horas</div></div>
      <div class="block"><div class="num" id="m">00</div><div class="lab">min</div></div>
      <div class="block"><div class="num" id="s">00</div><div class="lab">seg</div></div>
    </div>
    <div class="done" id="done" hidden>Encerrado</div>
  </div>
  <script id="CFG" type="application/json">{config_json}</script>
  <script>
  (function(){{
    const cfg=JSON.parse(document.getElementById('CFG').textContent);
    const elT=document.getElementById('t'),elW=document.getElementById('w'),elC=document.getElementById('c');
    const elD=document.getElementById('d'),elH=document.getElementById('h'),elM=document.getElementById('m'),elS=document.getElementById('s'),elDone=document.getElementById('done');
    elT.textContent=cfg.title;
    const dl=new Date(cfg.deadlineISO);
    try{{const fmt=new Intl.DateTimeFormat(undefined,{{dateStyle:'full',timeStyle:'short'}});elW.textContent='Prazo: '+fmt.format(dl)}}catch{{elW.textContent='Prazo: '+dl.toString()}}
    function pad2(n){{n=Math.floor(n);return(n<10?'0':'')+n}}
    function tick(){{
      const now=new Date();let diff=dl.getTime()-now.getTime();
      if(diff<=0){{elC.hidden=true;elDone.hidden=false;return}}
      elC.hidden=false;elDone.hidden=true;
      const s=Math.floor(diff/1000),d=Math.floor(s/86400),h=Math.floor((s%86400)/3600),m=Math.floor((s%3600)/60),sec=s%60;
      elD.textContent=d;elH.textContent=pad2(h);elM.textContent=pad2(m);elS.textContent=pad2(sec);
    }}
    tick();setInterval(tick,1000)
  }})();
  </script>
</body>
</html>"#,
        bg = config.bg_color,
        fg = config.text_color,
        accent = config.accent_color,
        font = config.font_family,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_scripts_and_handlers() {
        assert_eq!(
            sanitize_user_html("<script>x</script><p onclick=a>hi</p>"),
            "<p>hi</p>"
        );
        assert_eq!(
            sanitize_user_html("<SCRIPT type=\"text/javascript\">\nalert(1)\n</SCRIPT><b>ok</b>"),
            "<b>ok</b>"
        );
        assert_eq!(
            sanitize_user_html(r#"<img src="a.png" onerror="x()" onload='y()'>"#),
            r#"<img src="a.png">"#
        );
    }

    #[test]
    fn leaves_plain_markup_alone() {
        let html = r#"<h1 style="color:red">Reunião</h1><p class="one">10h</p>"#;
        assert_eq!(sanitize_user_html(html), html);
    }

    #[test]
    fn align_is_restricted() {
        assert_eq!(normalize_align("LEFT"), "left");
        assert_eq!(normalize_align("justify"), "justify");
        assert_eq!(normalize_align("middle"), "center");
        assert_eq!(normalize_align(""), "center");
    }

    #[test]
    fn px_values_accept_numbers_and_strings() {
        assert_eq!(coerce_px(Some(&json!(32))), Some(32));
        assert_eq!(coerce_px(Some(&json!("40"))), Some(40));
        assert_eq!(coerce_px(Some(&json!(" 12.6 "))), Some(13));
        assert_eq!(coerce_px(Some(&json!(0))), None);
        assert_eq!(coerce_px(Some(&json!("abc"))), None);
        assert_eq!(coerce_px(Some(&json!(true))), None);
        assert_eq!(coerce_px(None), None);
    }

    #[test]
    fn fields_fall_back_to_defaults() {
        let style = NoticeStyle::from_fields(&NoticeFields {
            title: Some(String::new()),
            font_size_px: Some(json!("0")),
            padding_px: Some(json!("16")),
            text_align: Some("Right".to_string()),
            ..NoticeFields::default()
        });

        assert_eq!(style.title, DEFAULT_TITLE);
        assert_eq!(style.font_size_px, DEFAULT_FONT_SIZE_PX);
        assert_eq!(style.padding_px, 16);
        assert_eq!(style.text_align, "right");
        assert_eq!(style.body_html, DEFAULT_BODY_HTML);
    }

    #[test]
    fn notice_page_escapes_title_and_sanitizes_body() {
        let style = NoticeStyle {
            title: "<b>Avisos</b>".to_string(),
            body_html: "<p onclick=\"x()\">Olá</p><script>bad()</script>".to_string(),
            font_size_px: 64,
            ..NoticeStyle::default()
        };
        let page = render_notice(&style);

        assert!(page.starts_with("<!doctype html>"));
        assert!(page.contains("<title>&lt;b&gt;Avisos&lt;/b&gt;</title>"));
        assert!(page.contains("<p>Olá</p>"));
        assert!(!page.contains("bad()"));
        assert!(page.contains("font-size:64px;"));
        assert!(page.contains("max-width:1200px;"));
        assert!(page.contains("text-align:center;"));
    }

    #[test]
    fn countdown_embeds_escaped_config() {
        let config = CountdownConfig::new("</script><script>alert(1)", "2030-01-01T00:00:00Z");
        let page = render_countdown(&config).unwrap();

        assert!(page.contains(r#""deadlineISO":"2030-01-01T00:00:00Z""#));
        assert!(page.contains(r##""accentColor":"#22c55e""##));
        assert!(!page.contains("</script><script>alert(1)"));
        assert!(page.contains("\\u003c/script>"));
        assert!(page.contains("--accent:#22c55e"));
        assert!(page.contains("Encerrado"));
    }

    #[test]
    fn countdown_config_survives_page_round_trip() {
        let mut config = CountdownConfig::new("Prazo <final>", "2031-05-01T12:00:00Z");
        config.accent_color = "#ff8800".to_string();
        let page = render_countdown(&config).unwrap();

        assert_eq!(CountdownConfig::from_page(&page), Some(config));
        assert_eq!(CountdownConfig::from_page(&render_notice(&NoticeStyle::default())), None);
    }

    #[test]
    fn countdown_rows_are_recognised_by_body() {
        let config = CountdownConfig::new("Entrega", "2031-05-01T12:00:00Z");
        let mut model = html_players::Model {
            id: 1,
            file_type: "html".to_string(),
            html_url: "/media/cd.html".to_string(),
            title: "Entrega".to_string(),
            body_html: config.body_placeholder(),
            bg_color: "#111111".to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size_px: DEFAULT_FONT_SIZE_PX,
            text_align: DEFAULT_TEXT_ALIGN.to_string(),
            padding_px: DEFAULT_PADDING_PX,
            max_width_px: DEFAULT_MAX_WIDTH_PX,
            schedule: crate::models::Schedule::all_week("UTC"),
            last_modified: 1,
            created_at: String::new(),
            updated_at: String::new(),
        };

        let restored = CountdownConfig::from_model(&model).unwrap();
        assert_eq!(restored.deadline_iso, "2031-05-01T12:00:00Z");
        assert_eq!(restored.bg_color, "#111111");
        assert_eq!(restored.accent_color, DEFAULT_ACCENT_COLOR);

        model.body_html = "<p>Reunião</p>".to_string();
        assert_eq!(CountdownConfig::from_model(&model), None);
    }
}
