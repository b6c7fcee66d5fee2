//! FFmpeg argument and filtergraph construction.
//!
//! Pure functions: everything here is deterministic string assembly, so
//! the exact command can be unit-tested without running ffmpeg.

use std::path::Path;

use crate::models::{
    AnimationInstruction, BackgroundSpec, CaptionChunk, DisplayMode, Resolution, TransitionType,
};

/// Horizontal padding kept clear on each side of an overlay.
const OVERLAY_SIDE_PADDING: u32 = 40;
/// Vertical gap between stacked overlays in overlay display mode.
const OVERLAY_STACK_GAP: u32 = 20;
/// Top anchor of the stack in overlay display mode.
const OVERLAY_STACK_TOP: u32 = 150;
/// Off-screen margin slide-in transitions start from.
const SLIDE_OFFSCREEN_MARGIN: u32 = 100;

/// Caption rendering style.
#[derive(Debug, Clone)]
pub struct CaptionStyle {
    /// Font file for drawtext; None lets ffmpeg pick a default.
    pub font_file: Option<String>,
    pub font_size: u32,
    pub text_color: String,
    /// Color for chunks carrying an emphasis token.
    pub emphasis_color: String,
    /// Outline thickness in pixels (thick outlines read well on mobile).
    pub outline_width: u32,
    /// Fixed pixel margin between caption baseline box and the bottom
    /// edge of the frame.
    pub bottom_margin_px: u32,
    /// Render caption text uppercase.
    pub uppercase: bool,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_file: None,
            font_size: 80,
            text_color: "yellow".to_string(),
            emphasis_color: "orange".to_string(),
            outline_width: 5,
            bottom_margin_px: 400,
            uppercase: true,
        }
    }
}

/// One overlay with its final frame placement resolved.
#[derive(Debug, Clone)]
pub struct OverlayPlacement {
    pub instruction: AnimationInstruction,
    /// Scaled display width.
    pub width: u32,
    /// Scaled display height.
    pub height: u32,
    /// Left edge in frame pixels.
    pub x: u32,
    /// Top edge in frame pixels.
    pub y: u32,
}

/// Compute frame placements for overlays whose source dimensions are
/// already known. Assets scale down (never up) to fit the frame width
/// minus padding and a mode-dependent height budget; overlay display
/// mode stacks assets vertically from a fixed top anchor.
pub fn layout_overlays(
    overlays: &[(AnimationInstruction, (u32, u32))],
    mode: DisplayMode,
    frame: Resolution,
) -> Vec<OverlayPlacement> {
    let max_width = frame.width.saturating_sub(2 * OVERLAY_SIDE_PADDING).max(1);
    let height_budget = match mode {
        DisplayMode::Overlay => (frame.height as f64 * 0.3) as u32,
        _ => (frame.height as f64 * 0.7) as u32,
    }
    .max(1);

    let mut placements = Vec::with_capacity(overlays.len());
    let mut stack_y = OVERLAY_STACK_TOP;

    for (instruction, (source_w, source_h)) in overlays {
        let scale = f64::min(
            1.0,
            f64::min(
                max_width as f64 / *source_w as f64,
                height_budget as f64 / *source_h as f64,
            ),
        );
        let width = ((*source_w as f64 * scale) as u32).max(1);
        let height = ((*source_h as f64 * scale) as u32).max(1);

        let x = (frame.width.saturating_sub(width)) / 2;
        let y = match mode {
            DisplayMode::Overlay => {
                let y = stack_y;
                stack_y += height + OVERLAY_STACK_GAP;
                y
            }
            _ => (frame.height.saturating_sub(height)) / 2,
        };

        placements.push(OverlayPlacement {
            instruction: instruction.clone(),
            width,
            height,
            x,
            y,
        });
    }

    placements
}

/// Build the complete ffmpeg argument list for one composition.
pub fn build_args(
    background: &BackgroundSpec,
    audio_path: &Path,
    captions: &[CaptionChunk],
    overlays: &[OverlayPlacement],
    style: &CaptionStyle,
    fps: u32,
    preset: &str,
    crf: u32,
    temp_output: &Path,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-nostdin".into(),
        "-y".into(),
    ];

    // Input 0: background, looped and/or seeked per the fit plan.
    if background.loop_count > 1 {
        args.push("-stream_loop".into());
        args.push((background.loop_count - 1).to_string());
    }
    if background.start_offset > 0.0 {
        args.push("-ss".into());
        args.push(format!("{:.3}", background.start_offset));
    }
    args.push("-i".into());
    args.push(background.source_path.display().to_string());

    // Input 1: the narration audio.
    args.push("-i".into());
    args.push(audio_path.display().to_string());

    // Inputs 2..: one looped still image per overlay.
    for placement in overlays {
        args.push("-loop".into());
        args.push("1".into());
        args.push("-i".into());
        args.push(placement.instruction.image_path.display().to_string());
    }

    args.push("-filter_complex".into());
    args.push(build_filtergraph(background, captions, overlays, style, fps));

    args.push("-map".into());
    args.push("[vout]".into());
    args.push("-map".into());
    args.push("1:a".into());

    args.push("-c:v".into());
    args.push("libx264".into());
    args.push("-preset".into());
    args.push(preset.to_string());
    args.push("-crf".into());
    args.push(crf.to_string());
    args.push("-pix_fmt".into());
    args.push("yuv420p".into());
    args.push("-c:a".into());
    args.push("aac".into());
    args.push("-b:a".into());
    args.push("192k".into());
    args.push("-t".into());
    args.push(format!("{:.3}", background.duration));
    args.push("-movflags".into());
    args.push("+faststart".into());

    args.push(temp_output.display().to_string());
    args
}

/// Assemble the filter_complex string: background prep, overlay chain,
/// caption drawtext chain.
fn build_filtergraph(
    background: &BackgroundSpec,
    captions: &[CaptionChunk],
    overlays: &[OverlayPlacement],
    style: &CaptionStyle,
    fps: u32,
) -> String {
    let mut filters: Vec<String> = Vec::new();

    let crop = background.crop;
    let target = background.target;
    filters.push(format!(
        "[0:v]crop={}:{}:{}:{},scale={}:{},fps={},trim=duration={:.3},setpts=PTS-STARTPTS[base]",
        crop.width, crop.height, crop.x, crop.y, target.width, target.height, fps,
        background.duration
    ));

    let mut last_label = "base".to_string();

    for (index, placement) in overlays.iter().enumerate() {
        let input_index = 2 + index;
        let prep_label = format!("ov{}", index);
        let out_label = format!("v{}", index);

        filters.push(overlay_prep_filter(placement, input_index, &prep_label));
        filters.push(overlay_merge_filter(
            placement,
            target,
            &last_label,
            &prep_label,
            &out_label,
        ));
        last_label = out_label;
    }

    let caption_chain = caption_filters(captions, style);
    if caption_chain.is_empty() {
        filters.push(format!("[{}]null[vout]", last_label));
    } else {
        filters.push(format!("[{}]{}[vout]", last_label, caption_chain.join(",")));
    }

    filters.join(";")
}

/// Scale/format/fade preparation for one overlay input stream.
fn overlay_prep_filter(placement: &OverlayPlacement, input_index: usize, label: &str) -> String {
    let instr = &placement.instruction;
    let start = instr.start;
    let dur = instr.transition_duration;

    match instr.transition {
        TransitionType::Fade => format!(
            "[{}:v]scale={}:{},format=rgba,fade=t=in:st={:.3}:d={:.3}:alpha=1[{}]",
            input_index, placement.width, placement.height, start, dur, label
        ),
        TransitionType::ZoomIn => format!(
            "[{}:v]scale=eval=frame:w='{}*clip(0.8+0.2*(t-{:.3})/{:.3},0.8,1)':h=-1,format=rgba[{}]",
            input_index, placement.width, start, dur, label
        ),
        // Motion transitions keep a static scale; the movement lives in
        // the overlay position expression.
        TransitionType::SlideUp | TransitionType::SlideIn => format!(
            "[{}:v]scale={}:{},format=rgba[{}]",
            input_index, placement.width, placement.height, label
        ),
    }
}

/// Overlay filter with per-transition position expressions and the
/// visibility window.
fn overlay_merge_filter(
    placement: &OverlayPlacement,
    frame: Resolution,
    base_label: &str,
    prep_label: &str,
    out_label: &str,
) -> String {
    let instr = &placement.instruction;
    let start = instr.start;
    let end = instr.end;
    let dur = instr.transition_duration;

    let (x_expr, y_expr) = match instr.transition {
        TransitionType::SlideUp => {
            // Ease-out cubic rise from below the frame.
            let y = format!(
                "'if(lt(t,{start:.3}+{dur:.3}),{fh}-({fh}-{y})*(1-pow(1-(t-{start:.3})/{dur:.3},3)),{y})'",
                fh = frame.height,
                y = placement.y,
            );
            (placement.x.to_string(), y)
        }
        TransitionType::SlideIn => {
            // Ease-out cubic entrance from beyond the right edge.
            let from = frame.width + SLIDE_OFFSCREEN_MARGIN;
            let x = format!(
                "'if(lt(t,{start:.3}+{dur:.3}),{from}-({from}-{x})*(1-pow(1-(t-{start:.3})/{dur:.3},3)),{x})'",
                x = placement.x,
            );
            (x, placement.y.to_string())
        }
        _ => (placement.x.to_string(), placement.y.to_string()),
    };

    format!(
        "[{}][{}]overlay=x={}:y={}:enable='between(t,{:.3},{:.3})'[{}]",
        base_label, prep_label, x_expr, y_expr, start, end, out_label
    )
}

/// One drawtext filter per caption chunk.
fn caption_filters(captions: &[CaptionChunk], style: &CaptionStyle) -> Vec<String> {
    captions
        .iter()
        .map(|chunk| {
            let raw = if style.uppercase {
                chunk.text.to_uppercase()
            } else {
                chunk.text.clone()
            };
            let color = if chunk.has_emphasis {
                &style.emphasis_color
            } else {
                &style.text_color
            };

            // Escaped but unquoted: backslash escapes do not work inside
            // single-quoted filter values.
            let mut parts = vec![format!("text={}", escape_drawtext(&raw))];
            if let Some(ref font) = style.font_file {
                parts.push(format!("fontfile={}", escape_drawtext(font)));
            }
            parts.push(format!("fontsize={}", style.font_size));
            parts.push(format!("fontcolor={}", color));
            parts.push(format!("borderw={}", style.outline_width));
            parts.push("bordercolor=black".to_string());
            parts.push("x=(w-text_w)/2".to_string());
            // Fixed pixel margin from the bottom edge.
            parts.push(format!("y=h-{}-th", style.bottom_margin_px));
            parts.push(format!(
                "enable='between(t,{:.3},{:.3})'",
                chunk.start, chunk.end
            ));

            format!("drawtext={}", parts.join(":"))
        })
        .collect()
}

/// Escape characters that are special inside a filtergraph value.
fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '\'' | ':' | ',' | ';' | '[' | ']' | '%' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
