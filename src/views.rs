//! HTML pages, rendered from small view models without a template engine.

use crate::upload::{Phase, UploadMachine, ZoomTarget};

const COMMON_STYLES: &str = r#"
    * { box-sizing: border-box; }
    body {
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
        margin: 0;
        background: #f4f1ec;
        color: #2d2a26;
    }
    .auth-container {
        max-width: 420px;
        margin: 60px auto;
        padding: 0 20px;
    }
    .brand {
        text-align: center;
        font-size: 28px;
        font-weight: bold;
        margin-bottom: 20px;
    }
    .card {
        background: white;
        padding: 30px;
        border-radius: 10px;
        box-shadow: 0 2px 8px rgba(0,0,0,0.08);
    }
    .subtitle { color: #777; margin-top: -8px; }
    .form-group { margin: 15px 0; }
    label { display: block; font-weight: bold; margin-bottom: 5px; }
    input[type="text"], input[type="email"], input[type="password"] {
        width: 100%;
        padding: 10px;
        border: 1px solid #ddd;
        border-radius: 6px;
        font-size: 14px;
    }
    .checkbox-label { display: flex; gap: 8px; align-items: center; font-weight: normal; }
    .placeholder-link { color: #c2185b; text-decoration: underline; cursor: default; }
    button, .btn {
        background: #c2185b;
        color: white;
        padding: 10px 20px;
        border: none;
        border-radius: 6px;
        cursor: pointer;
        font-size: 14px;
        font-weight: bold;
        text-decoration: none;
        display: inline-block;
    }
    button:disabled { background: #aaa; cursor: wait; }
    .btn-secondary { background: #777; }
    .alert { padding: 10px; border-radius: 6px; margin: 10px 0; }
    .alert-error { color: #a94442; background: #f2dede; }
    .alert-success { color: #3c763d; background: #dff0d8; }
    .switch { text-align: center; margin-top: 20px; }
    .navbar {
        display: flex;
        justify-content: space-between;
        align-items: center;
        padding: 15px 30px;
        background: white;
        box-shadow: 0 1px 4px rgba(0,0,0,0.08);
    }
    .navbar .user { display: flex; gap: 15px; align-items: center; }
    .navbar .email { color: #777; font-size: 13px; }
    main { max-width: 1000px; margin: 30px auto; padding: 0 20px; }
    .upload-box {
        background: white;
        border: 2px dashed #c2185b;
        border-radius: 10px;
        padding: 40px;
        text-align: center;
    }
    .upload-box.dragover { background: #fce4ec; }
    .file-info { color: #777; font-size: 13px; }
    .loading { text-align: center; padding: 30px; }
    .comparison { display: flex; gap: 20px; flex-wrap: wrap; }
    .image-box { flex: 1; min-width: 280px; background: white; padding: 15px; border-radius: 10px; }
    .image-box img { width: 100%; cursor: zoom-in; }
    .actions { margin-top: 20px; display: flex; gap: 10px; }
    .zoom {
        position: fixed;
        inset: 0;
        background: rgba(0,0,0,0.9);
        display: flex;
        flex-direction: column;
        align-items: center;
        justify-content: center;
        gap: 15px;
    }
    .zoom img { max-width: 95vw; max-height: 85vh; }
    [hidden] { display: none !important; }
"#;

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn alerts(error: Option<&str>, success: Option<&str>) -> String {
    let mut html = String::new();
    if let Some(e) = error {
        html.push_str(&format!(
            r#"<div class="alert alert-error">{}</div>"#,
            html_escape(e)
        ));
    }
    if let Some(s) = success {
        html.push_str(&format!(
            r#"<div class="alert alert-success">{}</div>"#,
            html_escape(s)
        ));
    }
    html
}

fn page(title: &str, body_attrs: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Splash</title>
    <style>{COMMON_STYLES}</style>
</head>
<body{body_attrs}>
{body}
</body>
</html>"#,
        title = html_escape(title),
    )
}

#[derive(Debug, Default)]
pub struct LoginView {
    /// Previously typed email, kept on failure.
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

pub fn login_page(view: &LoginView) -> String {
    let body = format!(
        r#"<div class="auth-container">
    <div class="brand">Splash</div>
    <div class="card">
        <h2>Welcome Back</h2>
        <p class="subtitle">Sign in to continue colorizing your photos</p>
        {alerts}
        <form method="post" action="/login">
            <div class="form-group">
                <label for="email">Email Address</label>
                <input type="email" id="email" name="email" placeholder="your@email.com" required value="{email}">
            </div>
            <div class="form-group">
                <label for="password">Password</label>
                <input type="password" id="password" name="password" placeholder="Enter your password" required>
            </div>
            <div class="form-group">
                <label class="checkbox-label"><input type="checkbox" name="remember"> Remember me</label>
            </div>
            <button type="submit">Sign In</button>
        </form>
        <p class="switch">Don't have an account? <a href="/register">Create Account</a></p>
    </div>
</div>"#,
        alerts = alerts(view.error.as_deref(), view.success.as_deref()),
        email = html_escape(&view.email),
    );
    page("Sign In", "", &body)
}

#[derive(Debug, Default)]
pub struct RegisterView {
    pub full_name: String,
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

pub fn register_page(view: &RegisterView) -> String {
    let body = format!(
        r#"<div class="auth-container">
    <div class="brand">Splash</div>
    <div class="card">
        <h2>Create Account</h2>
        <p class="subtitle">Start colorizing your photos today</p>
        {alerts}
        <form method="post" action="/register">
            <div class="form-group">
                <label for="full_name">Full Name</label>
                <input type="text" id="full_name" name="full_name" placeholder="John Doe" maxlength="100" required value="{full_name}">
            </div>
            <div class="form-group">
                <label for="email">Email Address</label>
                <input type="email" id="email" name="email" placeholder="your@email.com" maxlength="100" required value="{email}">
            </div>
            <div class="form-group">
                <label for="password">Password</label>
                <input type="password" id="password" name="password" placeholder="Create a strong password" required>
            </div>
            <div class="form-group">
                <label for="confirm_password">Confirm Password</label>
                <input type="password" id="confirm_password" name="confirm_password" placeholder="Confirm your password" required>
            </div>
            <div class="form-group">
                <label class="checkbox-label">
                    <input type="checkbox" name="agree_terms" required>
                    <span>I agree to the <span class="placeholder-link">Terms of Service</span> and <span class="placeholder-link">Privacy Policy</span></span>
                </label>
            </div>
            <button type="submit">Create Account</button>
        </form>
        <p class="switch">Already have an account? <a href="/login">Sign In</a></p>
    </div>
</div>"#,
        alerts = alerts(view.error.as_deref(), view.success.as_deref()),
        full_name = html_escape(&view.full_name),
        email = html_escape(&view.email),
    );
    page("Create Account", "", &body)
}

/// What the main page shows of the caller's upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadView {
    pub phase: Phase,
    pub file_name: Option<String>,
    pub error: Option<String>,
    pub error_display_ms: u64,
    pub zoom: Option<ZoomTarget>,
    /// Processed image on the colorization API.
    pub colorized_url: Option<String>,
    pub max_bytes: usize,
    pub max_mb: usize,
}

impl From<&UploadMachine> for UploadView {
    fn from(m: &UploadMachine) -> Self {
        let limits = m.limits();
        Self {
            phase: m.phase(),
            file_name: m.file_name().map(str::to_owned),
            error: m.error_message().map(str::to_owned),
            error_display_ms: limits.error_display.as_millis() as u64,
            zoom: m.result().and_then(|r| r.zoom),
            colorized_url: m.download_url().map(str::to_owned),
            max_bytes: limits.max_bytes,
            max_mb: limits.limit_mb(),
        }
    }
}

#[derive(Debug)]
pub struct HomeView {
    pub name: String,
    pub email: String,
    pub upload: UploadView,
}

fn hidden_unless(visible: bool) -> &'static str {
    if visible {
        ""
    } else {
        " hidden"
    }
}

fn zoom_overlay(upload: &UploadView) -> String {
    let (src, label) = match (upload.zoom, upload.colorized_url.as_deref()) {
        (Some(ZoomTarget::Original), _) => ("/results/original".to_string(), "Original Image"),
        (Some(ZoomTarget::Colorized), Some(url)) => (html_escape(url), "Colorized Image"),
        _ => return String::new(),
    };
    format!(
        r#"<div class="zoom" id="zoom">
        <img src="{src}" alt="{label}">
        <a class="btn" href="/">Back to Results</a>
    </div>"#
    )
}

pub fn home_page(view: &HomeView) -> String {
    let upload = &view.upload;
    let has_result = upload.phase == Phase::ResultReady;
    let colorized = upload
        .colorized_url
        .as_deref()
        .map(html_escape)
        .unwrap_or_default();

    let body = format!(
        r#"<nav class="navbar">
    <div class="brand">Splash</div>
    <div class="user">
        <span class="user-name">Welcome, {name}</span>
        <span class="email">{email}</span>
        <a class="btn btn-secondary" href="/logout">Sign Out</a>
    </div>
</nav>
<main>
    <section class="upload-box" id="upload-box"{upload_hidden}>
        <h3>Upload Your Image</h3>
        <p>Click to browse or drag and drop your black and white photo</p>
        <p class="file-info">Supports: JPG, PNG, WEBP (Max {max_mb}MB)</p>
        <input type="file" id="image-input" name="image" accept="image/*" hidden>
        <button type="button" id="browse">Browse Files</button>
    </section>

    <section class="loading" id="loading"{loading_hidden}>
        <p>Processing your image...</p>
        <p class="file-info" id="file-name">{file_name}</p>
    </section>

    <div class="alert alert-error" id="error" data-display-ms="{display_ms}"{error_hidden}>{error}</div>

    <section id="results"{results_hidden}>
        <form method="post" action="/reset"><button type="submit">Colorize Another Image</button></form>
        <h2>Results</h2>
        <div class="comparison">
            <div class="image-box">
                <h3>Original Image</h3>
                <a href="/?view=original"><img id="original-image" src="{original_src}" alt="Original"></a>
            </div>
            <div class="image-box">
                <h3>Colorized Image</h3>
                <a href="/?view=colorized"><img id="colorized-image" src="{colorized}" alt="Colorized"></a>
            </div>
        </div>
        <div class="actions">
            <button type="button" id="download">Download Colorized Image</button>
        </div>
    </section>
    {zoom}
</main>
<script src="/static/app.js"></script>"#,
        name = html_escape(&view.name),
        email = html_escape(&view.email),
        max_mb = upload.max_mb,
        upload_hidden = hidden_unless(!has_result && upload.phase != Phase::Submitting),
        loading_hidden = hidden_unless(upload.phase == Phase::Submitting),
        file_name = upload.file_name.as_deref().map(html_escape).unwrap_or_default(),
        display_ms = upload.error_display_ms,
        error_hidden = hidden_unless(upload.error.is_some()),
        error = upload.error.as_deref().map(html_escape).unwrap_or_default(),
        results_hidden = hidden_unless(has_result),
        original_src = if has_result { "/results/original" } else { "" },
        zoom = zoom_overlay(upload),
    );

    let attrs = format!(r#" data-max-bytes="{}" data-max-mb="{}""#, upload.max_bytes, upload.max_mb);
    page("Colorize Your Photos", &attrs, &body)
}

/// Shown when a request fails for reasons the user cannot fix.
pub fn error_page(message: &str) -> String {
    let body = format!(
        r#"<div class="auth-container">
    <div class="brand">Splash</div>
    <div class="card">
        <div class="alert alert-error">{}</div>
        <p class="switch"><a href="/">Back</a></p>
    </div>
</div>"#,
        html_escape(message)
    );
    page("Error", "", &body)
}
