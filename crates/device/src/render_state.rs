//! Native state transitions behind the device's render-state operations.
//!
//! Nothing is cached: every call issues the native change and checks the
//! error flag right after it.

use crate::error::DeviceError;
use glhal_common::{BlendMode, Rect};
use glhal_native::{BlendEquation, BlendFactor, Capability, ClearBuffers, GlBackend};

/// Factors and equation for an enabled blend mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendFunc {
    pub src: BlendFactor,
    pub dst: BlendFactor,
    pub equation: BlendEquation,
}

impl BlendFunc {
    const fn new(src: BlendFactor, dst: BlendFactor, equation: BlendEquation) -> Self {
        Self { src, dst, equation }
    }
}

/// Blend configuration for `mode`; `None` means blending is disabled.
pub fn blend_func(mode: BlendMode) -> Option<BlendFunc> {
    use BlendEquation::{Add, ReverseSubtract};
    use BlendFactor::{DstColor, One, OneMinusSrcAlpha, SrcColor, Zero};

    let func = match mode {
        BlendMode::None => return None,
        BlendMode::Alpha => BlendFunc::new(One, OneMinusSrcAlpha, Add),
        BlendMode::Additive => BlendFunc::new(One, One, Add),
        BlendMode::Subtractive => BlendFunc::new(One, One, ReverseSubtract),
        BlendMode::Multiply => BlendFunc::new(DstColor, OneMinusSrcAlpha, Add),
        BlendMode::Multiplicative => BlendFunc::new(Zero, SrcColor, Add),
        BlendMode::DoubleMultiplicative => BlendFunc::new(DstColor, SrcColor, Add),
    };
    Some(func)
}

/// Native scissor box `(x, y, width, height)` for a top-left-origin rect in
/// a window `window_height` pixels tall. Negative extents clamp to zero and
/// coordinates saturate at the `i32` range.
pub fn scissor_box(rect: Rect, window_height: i32) -> (i32, i32, i32, i32) {
    let rect = rect.clamped();
    (
        rect.left,
        window_height.saturating_sub(rect.bottom()),
        rect.width,
        rect.height,
    )
}

/// Read the error flag after `call`, logging any failure on the
/// diagnostics target.
pub(crate) fn check(gl: &dyn GlBackend, call: &'static str) -> Result<(), DeviceError> {
    gl.check(call).map_err(|e| {
        tracing::error!(target: "graphics", "{e}");
        DeviceError::NativeState(e)
    })
}

pub(crate) fn clear(gl: &dyn GlBackend) -> Result<(), DeviceError> {
    gl.clear_color(0.0, 0.0, 0.0, 1.0);
    check(gl, "glClearColor")?;
    gl.clear(ClearBuffers::Color);
    check(gl, "glClear")
}

pub(crate) fn enable_depth_buffer(gl: &dyn GlBackend) -> Result<(), DeviceError> {
    gl.clear(ClearBuffers::Depth);
    check(gl, "glClear")?;
    gl.enable(Capability::DepthTest);
    check(gl, "glEnable")
}

pub(crate) fn disable_depth_buffer(gl: &dyn GlBackend) -> Result<(), DeviceError> {
    gl.disable(Capability::DepthTest);
    check(gl, "glDisable")
}

pub(crate) fn set_blend_mode(gl: &dyn GlBackend, mode: BlendMode) -> Result<(), DeviceError> {
    gl.blend_equation(BlendEquation::Add);
    check(gl, "glBlendEquation")?;

    let Some(func) = blend_func(mode) else {
        gl.disable(Capability::Blend);
        return check(gl, "glDisable");
    };
    gl.enable(Capability::Blend);
    check(gl, "glEnable")?;
    gl.blend_func(func.src, func.dst);
    check(gl, "glBlendFunc")?;
    if func.equation != BlendEquation::Add {
        gl.blend_equation(func.equation);
        check(gl, "glBlendEquation")?;
    }
    Ok(())
}

pub(crate) fn enable_scissor(
    gl: &dyn GlBackend,
    rect: Rect,
    window_height: i32,
) -> Result<(), DeviceError> {
    let (x, y, width, height) = scissor_box(rect, window_height);
    gl.scissor(x, y, width, height);
    check(gl, "glScissor")?;
    gl.enable(Capability::ScissorTest);
    check(gl, "glEnable")
}

pub(crate) fn disable_scissor(gl: &dyn GlBackend) -> Result<(), DeviceError> {
    gl.disable(Capability::ScissorTest);
    check(gl, "glDisable")
}

pub(crate) fn set_line_width(gl: &dyn GlBackend, width: f32) -> Result<(), DeviceError> {
    gl.line_width(width);
    check(gl, "glLineWidth")
}

#[cfg(test)]
mod tests {
    use super::*;
    use glhal_native::testing::{FakeGl, GlCall};

    #[test]
    fn blend_table() {
        use BlendEquation::{Add, ReverseSubtract};
        use BlendFactor::*;

        let expected = [
            (BlendMode::None, None),
            (BlendMode::Alpha, Some((One, OneMinusSrcAlpha, Add))),
            (BlendMode::Additive, Some((One, One, Add))),
            (BlendMode::Subtractive, Some((One, One, ReverseSubtract))),
            (BlendMode::Multiply, Some((DstColor, OneMinusSrcAlpha, Add))),
            (BlendMode::Multiplicative, Some((Zero, SrcColor, Add))),
            (BlendMode::DoubleMultiplicative, Some((DstColor, SrcColor, Add))),
        ];
        for (mode, want) in expected {
            let got = blend_func(mode).map(|f| (f.src, f.dst, f.equation));
            assert_eq!(got, want, "{mode:?}");
        }
    }

    #[test]
    fn every_mode_resets_the_equation_first() {
        let gl = FakeGl::new();
        for mode in BlendMode::ALL {
            set_blend_mode(&gl, mode).unwrap();
            let calls = gl.take_calls();
            assert_eq!(calls[0], GlCall::BlendEquation(BlendEquation::Add), "{mode:?}");
        }
    }

    #[test]
    fn subtractive_issues_reverse_equation_last() {
        let gl = FakeGl::new();
        set_blend_mode(&gl, BlendMode::Subtractive).unwrap();
        assert_eq!(
            gl.calls(),
            vec![
                GlCall::BlendEquation(BlendEquation::Add),
                GlCall::Enable(Capability::Blend),
                GlCall::BlendFunc(BlendFactor::One, BlendFactor::One),
                GlCall::BlendEquation(BlendEquation::ReverseSubtract),
            ]
        );
    }

    #[test]
    fn none_disables_blending() {
        let gl = FakeGl::new();
        set_blend_mode(&gl, BlendMode::None).unwrap();
        assert_eq!(
            gl.calls(),
            vec![
                GlCall::BlendEquation(BlendEquation::Add),
                GlCall::Disable(Capability::Blend),
            ]
        );
    }

    #[test]
    fn scissor_flips_to_bottom_origin() {
        assert_eq!(scissor_box(Rect::new(10, 20, 100, 50), 600), (10, 530, 100, 50));
    }

    #[test]
    fn scissor_saturates_far_off_window() {
        assert_eq!(
            scissor_box(Rect::new(0, i32::MAX, 10, 10), 600),
            (0, 600 - i32::MAX, 10, 10)
        );
        assert_eq!(
            scissor_box(Rect::new(0, i32::MIN, 10, 10), 600),
            (0, i32::MAX, 10, 10)
        );
    }

    #[test]
    fn scissor_clamps_negative_extents() {
        assert_eq!(scissor_box(Rect::new(5, 20, -3, -7), 600), (5, 580, 0, 0));

        let gl = FakeGl::new();
        enable_scissor(&gl, Rect::new(0, 0, -1, 10), 100).unwrap();
        assert_eq!(
            gl.calls(),
            vec![
                GlCall::Scissor {
                    x: 0,
                    y: 90,
                    width: 0,
                    height: 10
                },
                GlCall::Enable(Capability::ScissorTest),
            ]
        );
    }

    #[test]
    fn native_error_stops_the_sequence() {
        let gl = FakeGl::new();
        gl.push_error(0x0500);
        let err = set_blend_mode(&gl, BlendMode::Alpha).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::NativeState(e) if e.call == "glBlendEquation" && e.code == 0x0500
        ));
        assert_eq!(gl.calls().len(), 1);
    }

    #[test]
    fn depth_enable_clears_then_enables() {
        let gl = FakeGl::new();
        enable_depth_buffer(&gl).unwrap();
        disable_depth_buffer(&gl).unwrap();
        assert_eq!(
            gl.calls(),
            vec![
                GlCall::Clear(ClearBuffers::Depth),
                GlCall::Enable(Capability::DepthTest),
                GlCall::Disable(Capability::DepthTest),
            ]
        );
    }

    #[test]
    fn clear_is_opaque_black() {
        let gl = FakeGl::new();
        clear(&gl).unwrap();
        assert_eq!(
            gl.calls(),
            vec![
                GlCall::ClearColor([0.0, 0.0, 0.0, 1.0]),
                GlCall::Clear(ClearBuffers::Color),
            ]
        );
    }
}
