// Script templates for the render webview
// Each function returns JavaScript that the render window evaluates as-is

/// p5.js build loaded into every sketch frame
pub const P5_LIBRARY_URL: &str = "https://cdn.jsdelivr.net/npm/p5@1.9.2/lib/p5.min.js";

/// Crossfade length in milliseconds, matched by the CSS transition below
pub const CROSSFADE_MS: u32 = 150;

/// z-index of the editor preview frame, above every lane
pub const SINGLE_PREVIEW_Z_INDEX: u32 = 1000;

/// Make sketch source safe to embed in a JS template literal and point
/// relative image loads at the local image server
///
/// `loadImage("images/x.png")` becomes
/// `loadImage("http://localhost:{port}/x.png")`, for either quote style.
pub fn prepare_script(code: &str, image_port: u16) -> String {
    let escaped = code
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace('$', "\\$");

    escaped
        .replace(
            "loadImage(\"images",
            &format!("loadImage(\"http://localhost:{}", image_port),
        )
        .replace(
            "loadImage('images",
            &format!("loadImage('http://localhost:{}", image_port),
        )
}

fn sketch_document(script: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8" />
  <style>
    body {{ margin: 0; padding: 0; overflow: hidden; background: transparent; }}
    canvas {{ display: block; background: transparent; }}
  </style>
  <script src="{P5_LIBRARY_URL}"><\/script>
</head>
<body>
  <script>
{script}
  <\/script>
</body>
</html>"#
    )
}

/// Swap the sketch in one lane with a crossfade
///
/// A hidden frame is loaded next to the current one, faded in once ready,
/// and takes over the lane id when the old frame is removed.
pub fn lane_crossfade_js(lane_index: usize, prepared_script: &str) -> String {
    let frame_id = format!("p5-frame-lane-{}", lane_index);
    let z_index = lane_index + 1;
    let document = sketch_document(prepared_script);
    let fade_secs = CROSSFADE_MS as f64 / 1000.0;

    format!(
        r#"(function() {{
  const currentFrame = document.getElementById("{frame_id}");
  const nextFrame = document.createElement("iframe");
  nextFrame.id = "{frame_id}-next";
  nextFrame.style.border = "none";
  nextFrame.style.width = "100vw";
  nextFrame.style.height = "100vh";
  nextFrame.style.position = "absolute";
  nextFrame.style.top = "0";
  nextFrame.style.left = "0";
  nextFrame.style.zIndex = "{z_index}";
  nextFrame.style.pointerEvents = "none";
  nextFrame.style.opacity = "0";
  nextFrame.style.transition = "opacity {fade_secs}s ease-in-out";
  document.body.appendChild(nextFrame);

  if (currentFrame) {{
    currentFrame.style.zIndex = "{z_index}";
    currentFrame.style.transition = "opacity {fade_secs}s ease-in-out";
  }}

  nextFrame.srcdoc = `{document}`;

  nextFrame.onload = function() {{
    nextFrame.style.opacity = "1";
    if (currentFrame) {{
      currentFrame.style.opacity = "0";
    }}
    setTimeout(function() {{
      if (currentFrame) {{
        currentFrame.remove();
      }}
      nextFrame.id = "{frame_id}";
    }}, {CROSSFADE_MS});
  }};

  if (!currentFrame) {{
    nextFrame.style.opacity = "1";
    nextFrame.id = "{frame_id}";
  }}
}})();"#
    )
}

/// Remove every lane frame
pub fn clear_all_lanes_js() -> &'static str {
    r#"(function() {
  document.querySelectorAll('[id^="p5-frame-lane-"]').forEach(frame => frame.remove());
})();"#
}

/// Remove one lane frame, if present
pub fn clear_lane_js(lane_index: usize) -> String {
    format!(
        r#"(function() {{
  const laneFrame = document.getElementById("p5-frame-lane-{lane_index}");
  if (laneFrame) {{
    laneFrame.remove();
  }}
}})();"#
    )
}

/// Remove the editor preview frame, if present
pub fn clear_single_preview_js() -> &'static str {
    r#"(function() {
  const singleFrame = document.getElementById('single-iframe');
  if (singleFrame) {
    singleFrame.remove();
  }
})();"#
}

/// Replace every lane with one unlaned preview frame
pub fn single_preview_js(prepared_script: &str) -> String {
    let document = sketch_document(prepared_script);

    format!(
        r#"(function() {{
  document.querySelectorAll('[id^="p5-frame-lane-"]').forEach(frame => frame.remove());

  const existing = document.getElementById('single-iframe');
  if (existing) {{
    existing.remove();
  }}

  const iframe = document.createElement('iframe');
  iframe.id = 'single-iframe';
  iframe.style.width = '100vw';
  iframe.style.height = '100vh';
  iframe.style.border = 'none';
  iframe.style.position = 'absolute';
  iframe.style.top = '0';
  iframe.style.left = '0';
  iframe.style.zIndex = '{SINGLE_PREVIEW_Z_INDEX}';
  iframe.style.pointerEvents = 'none';
  document.body.appendChild(iframe);

  iframe.srcdoc = `{document}`;
}})();"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_script_escapes_template_literal() {
        let prepared = prepare_script(r"let s = `a ${b}` + '\n';", 8080);
        assert_eq!(prepared, r"let s = \`a \${b}\` + '\\n';");
    }

    #[test]
    fn test_prepare_script_rewrites_image_paths() {
        let code = r#"img = loadImage("images/a.png"); alt = loadImage('images/b.jpg');"#;
        let prepared = prepare_script(code, 9000);

        assert!(prepared.contains(r#"loadImage("http://localhost:9000/a.png")"#));
        assert!(prepared.contains("loadImage('http://localhost:9000/b.jpg')"));
    }

    #[test]
    fn test_prepare_script_leaves_other_paths() {
        let code = r#"loadImage("https://example.com/images/c.png"); loadJSON("images/d.json");"#;
        assert_eq!(prepare_script(code, 8080), code);
    }

    #[test]
    fn test_lane_crossfade_layout() {
        let js = lane_crossfade_js(3, "circle(10, 10, 5);");

        assert!(js.contains(r#"document.getElementById("p5-frame-lane-3")"#));
        assert!(js.contains(r#"nextFrame.style.zIndex = "4""#));
        assert!(js.contains("opacity 0.15s ease-in-out"));
        assert!(js.contains("}, 150);"));
        assert!(js.contains("circle(10, 10, 5);"));
        assert!(js.contains(P5_LIBRARY_URL));
    }

    #[test]
    fn test_clear_lane_targets_one_frame() {
        let js = clear_lane_js(0);
        assert!(js.contains(r#"getElementById("p5-frame-lane-0")"#));
        assert!(!js.contains("querySelectorAll"));
    }

    #[test]
    fn test_single_preview_layout() {
        let js = single_preview_js("noLoop();");
        assert!(js.contains("iframe.style.zIndex = '1000'"));
        assert!(js.contains("noLoop();"));
    }
}
