/// Recommended error type for your sweep `main` function and render target code. This type is
/// compatible with the [crate::target::RenderTarget] methods so you can use `?` to propagate errors.
pub type FrameTunnelResult<T> = anyhow::Result<T>;
