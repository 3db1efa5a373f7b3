//! Fit Allocator.
//!
//! `fitalloc`は、一つの連続したメモリプールを、選択可能な配置戦略に従って切り分けるアロケータ.
//!
//! 割当戦略ごとの挙動や性能を、汎用アロケータと比較・実験することを目的としている.
//!
//! # 特徴
//!
//! - プールは初期化時に一度だけ確保され、破棄時に一度だけ解放される
//! - 配置戦略は[FitStrategy]で指定する(first-fit, next-fit, best-fit, worst-fit)
//!   - 戦略は初期化時に決定され、プールが破棄されるまで変更されない
//! - プール内の全ての領域は、アドレス順に連結された台帳によって管理される
//!   - 台帳の領域群は、常にプール全体を隙間・重複なく覆う
//!   - 解放時には隣接する空き領域同士が結合される
//! - 台帳の容量(同時に存在可能な領域数)は構築時に固定される
//! - 全ての領域サイズはワード境界([Alignment])に切り上げられる
//! - スレッドセーフではない (必要な場合は利用者側で同期を行うこと)
//!
//! # モジュールの依存関係
//!
//! ```text
//! allocator => ledger
//!           => pool
//! ```
//!
//! - [Allocator]:
//!   - 利用者が直接触るのはこの構造体
//!   - `initialize`/`allocate`/`free`/`destroy`/`region_count`を提供する
//! - `ledger`:
//!   - プール内の領域(割当済み or 空き)をアドレス順に保持する双方向連結リスト
//! - `pool`:
//!   - `posix_memalign`で確保される生のバイト列
//!
//! # Examples
//!
//! ```
//! use fitalloc::{AllocatorBuilder, ErrorKind, FitStrategy};
//!
//! let mut allocator = AllocatorBuilder::new()
//!     .create(64, FitStrategy::WorstFit)
//!     .unwrap();
//!
//! let a = allocator.allocate(10).unwrap().unwrap();
//! let b = allocator.allocate(10).unwrap().unwrap();
//! assert_eq!(b.as_usize(), 12);
//!
//! allocator.free(a).unwrap();
//! let e = allocator.free(a).err().unwrap();
//! assert_eq!(*e.kind(), ErrorKind::InvalidFree);
//! ```
//!
//! [FitStrategy]: ./enum.FitStrategy.html
//! [Alignment]: ./struct.Alignment.html
//! [Allocator]: ./struct.Allocator.html
#![warn(missing_docs)]
extern crate libc;
extern crate prometrics;
#[macro_use]
extern crate trackable;
#[macro_use]
extern crate slog;

pub use crate::address::Address;
pub use crate::alignment::Alignment;
pub use crate::allocator::{Allocator, AllocatorBuilder, FitStrategy, Regions};
pub use crate::error::{Error, ErrorKind};
pub use crate::ledger::{Region, RegionKind};

pub mod metrics;

mod address;
mod alignment;
mod allocator;
mod error;
mod ledger;
mod pool;

/// crate固有の`Result`型.
pub type Result<T> = std::result::Result<T, Error>;
