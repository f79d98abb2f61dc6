// ABOUTME: Compile-fail test verifying container handles cannot be built by callers.
// ABOUTME: Handles are only produced by a successful provisioning attempt.

use testbed::provision::ContainerHandle;

fn main() {
    let _handle = ContainerHandle {
        name: "forged".to_string(),
    }; // ERROR: fields of ContainerHandle are private
}
