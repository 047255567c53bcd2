//! Macros to reduce boilerplate in layer implementations

/// Implements the property accessors of [`OverlayLayer`](crate::layers::base::OverlayLayer)
/// for a layer that keeps its [`LayerProperties`](crate::layers::base::LayerProperties)
/// in a field.
///
/// Usage:
/// ```ignore
/// impl OverlayLayer for MyLayer {
///     crate::impl_overlay_layer!(properties);
/// }
/// ```
#[macro_export]
macro_rules! impl_overlay_layer {
    ($properties_field:ident) => {
        fn id(&self) -> &str {
            &self.$properties_field.id
        }

        fn name(&self) -> &str {
            &self.$properties_field.name
        }

        fn kind(&self) -> $crate::layers::base::LayerKind {
            self.$properties_field.kind
        }

        fn z_index(&self) -> i32 {
            self.$properties_field.z_index
        }

        fn set_z_index(&mut self, z_index: i32) {
            self.$properties_field.z_index = z_index;
        }

        fn is_visible(&self) -> bool {
            self.$properties_field.visible
        }

        fn set_visible(&mut self, visible: bool) {
            self.$properties_field.visible = visible;
        }

        fn is_interactive(&self) -> bool {
            self.$properties_field.interactive
        }
    };
}
