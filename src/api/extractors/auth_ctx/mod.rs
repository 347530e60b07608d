/**
 * Responsibility
 *  - core と types を束ねる
 *  - 外部（handlers / middleware）に公開する型を制御する
 */
mod core;
mod types;

pub use core::AuthCtxExtractor;
pub use types::AuthCtx;
