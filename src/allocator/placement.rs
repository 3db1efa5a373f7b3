//! 割当要求に対して、使用する空き領域を選択するための配置戦略.
use std::fmt;
use std::str::FromStr;

use crate::ledger::{Ledger, SlotIndex};
use crate::{Error, ErrorKind};

/// 空き領域の選択戦略.
///
/// いずれの戦略も、要求サイズ以上の空き領域のみを候補とする.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FitStrategy {
    /// 先頭から走査して、最初に見つかった空き領域を選択する.
    FirstFit,

    /// 前回選択した位置から走査を再開し、最初に見つかった空き領域を選択する.
    ///
    /// 終端まで見つからなかった場合には、先頭から`FirstFit`と同様に走査し直す.
    NextFit,

    /// 候補の中で最もサイズが小さい空き領域を選択する.
    ///
    /// 同じサイズの候補が複数ある場合には、アドレスが小さい方が優先される.
    BestFit,

    /// 候補の中で最もサイズが大きい空き領域を選択する.
    ///
    /// 同じサイズの候補が複数ある場合には、アドレスが小さい方が優先される.
    WorstFit,
}
impl FitStrategy {
    /// 全ての戦略を列挙する.
    pub const ALL: [FitStrategy; 4] = [
        FitStrategy::FirstFit,
        FitStrategy::NextFit,
        FitStrategy::BestFit,
        FitStrategy::WorstFit,
    ];

    /// 戦略の名前を返す.
    pub fn as_str(self) -> &'static str {
        match self {
            FitStrategy::FirstFit => "first-fit",
            FitStrategy::NextFit => "next-fit",
            FitStrategy::BestFit => "best-fit",
            FitStrategy::WorstFit => "worst-fit",
        }
    }
}
impl Default for FitStrategy {
    fn default() -> Self {
        FitStrategy::FirstFit
    }
}
impl fmt::Display for FitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
impl FromStr for FitStrategy {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-fit" => Ok(FitStrategy::FirstFit),
            "next-fit" => Ok(FitStrategy::NextFit),
            "best-fit" => Ok(FitStrategy::BestFit),
            "worst-fit" => Ok(FitStrategy::WorstFit),
            _ => track_panic!(ErrorKind::InvalidInput, "Unknown fit strategy: {:?}", s),
        }
    }
}

/// 戦略と、`NextFit`用の走査位置を保持する選択器.
#[derive(Debug)]
pub(crate) struct Placement {
    strategy: FitStrategy,

    // `None`は台帳の先頭を意味する
    cursor: Option<SlotIndex>,
}
impl Placement {
    pub fn new(strategy: FitStrategy) -> Self {
        Placement {
            strategy,
            cursor: None,
        }
    }

    pub fn strategy(&self) -> FitStrategy {
        self.strategy
    }

    /// `size`バイトの割当に使う空き領域を選ぶ.
    ///
    /// 走査位置は変更しない. 割当が成功した場合には`commit`を呼び出すこと.
    pub fn select(&self, ledger: &Ledger, size: usize) -> Option<SlotIndex> {
        match self.strategy {
            FitStrategy::FirstFit => first_fit(ledger, size),
            FitStrategy::NextFit => next_fit(ledger, self.cursor, size),
            FitStrategy::BestFit => best_fit(ledger, size),
            FitStrategy::WorstFit => worst_fit(ledger, size),
        }
    }

    /// `slot`への割当が成功したことを通知する.
    pub fn commit(&mut self, slot: SlotIndex) {
        if self.strategy == FitStrategy::NextFit {
            self.cursor = Some(slot);
        }
    }

    /// 結合によって`reclaimed`スロットが`survivor`に吸収されたことを通知する.
    ///
    /// 走査位置が`reclaimed`を指していた場合には、同じアドレスを含む`survivor`に移す.
    pub fn on_reclaimed(&mut self, reclaimed: SlotIndex, survivor: SlotIndex) {
        if self.cursor == Some(reclaimed) {
            self.cursor = Some(survivor);
        }
    }
}

fn first_fit(ledger: &Ledger, size: usize) -> Option<SlotIndex> {
    first_fit_from(ledger, ledger.head(), size)
}

fn first_fit_from(ledger: &Ledger, start: Option<SlotIndex>, size: usize) -> Option<SlotIndex> {
    ledger
        .iter_from(start)
        .find(|(_, r)| r.is_hole() && r.size >= size)
        .map(|(slot, _)| slot)
}

fn next_fit(ledger: &Ledger, cursor: Option<SlotIndex>, size: usize) -> Option<SlotIndex> {
    let start = cursor.or_else(|| ledger.head());
    first_fit_from(ledger, start, size).or_else(|| first_fit(ledger, size))
}

fn best_fit(ledger: &Ledger, size: usize) -> Option<SlotIndex> {
    let mut best: Option<(SlotIndex, usize)> = None;
    for (slot, r) in ledger.iter() {
        if !r.is_hole() || r.size < size {
            continue;
        }
        // 等しい場合は先に見つかった方(低アドレス側)を残す
        if best.map_or(true, |(_, best_size)| r.size < best_size) {
            best = Some((slot, r.size));
        }
    }
    best.map(|(slot, _)| slot)
}

fn worst_fit(ledger: &Ledger, size: usize) -> Option<SlotIndex> {
    let mut worst: Option<(SlotIndex, usize)> = None;
    for (slot, r) in ledger.iter() {
        if !r.is_hole() || r.size < size {
            continue;
        }
        if worst.map_or(true, |(_, worst_size)| r.size > worst_size) {
            worst = Some((slot, r.size));
        }
    }
    worst.map(|(slot, _)| slot)
}

#[cfg(test)]
mod tests {
    use trackable::result::TestResult;

    use super::*;
    use crate::ledger::RegionKind;

    // [P:8][H:16][P:4][H:8][P:4][H:24]
    fn fragmented() -> Result<Ledger, Error> {
        let mut ledger = Ledger::new(16);
        let tail = track!(ledger.seed(64))?;
        for &(size, kind) in &[
            (8, RegionKind::Process),
            (16, RegionKind::Hole),
            (4, RegionKind::Process),
            (8, RegionKind::Hole),
            (4, RegionKind::Process),
        ] {
            let slot = track!(ledger.split_front(tail, size))?;
            ledger.set_kind(slot, kind);
        }
        Ok(ledger)
    }

    fn base_of(ledger: &Ledger, slot: Option<SlotIndex>) -> Option<usize> {
        slot.map(|s| ledger.region(s).base.as_usize())
    }

    #[test]
    fn first_fit_works() -> TestResult {
        let ledger = track!(fragmented())?;
        let p = Placement::new(FitStrategy::FirstFit);
        assert_eq!(base_of(&ledger, p.select(&ledger, 4)), Some(8));
        assert_eq!(base_of(&ledger, p.select(&ledger, 16)), Some(8));
        assert_eq!(base_of(&ledger, p.select(&ledger, 20)), Some(40));
        assert_eq!(p.select(&ledger, 28), None);
        Ok(())
    }

    #[test]
    fn best_fit_works() -> TestResult {
        let ledger = track!(fragmented())?;
        let p = Placement::new(FitStrategy::BestFit);
        assert_eq!(base_of(&ledger, p.select(&ledger, 4)), Some(28));
        assert_eq!(base_of(&ledger, p.select(&ledger, 12)), Some(8));
        assert_eq!(base_of(&ledger, p.select(&ledger, 24)), Some(40));
        assert_eq!(p.select(&ledger, 28), None);
        Ok(())
    }

    #[test]
    fn worst_fit_works() -> TestResult {
        let ledger = track!(fragmented())?;
        let p = Placement::new(FitStrategy::WorstFit);
        assert_eq!(base_of(&ledger, p.select(&ledger, 4)), Some(40));
        assert_eq!(base_of(&ledger, p.select(&ledger, 24)), Some(40));
        assert_eq!(p.select(&ledger, 28), None);
        Ok(())
    }

    #[test]
    fn ties_prefer_lower_address() -> TestResult {
        // [H:8][P:4][H:8][P:4][H:40]
        let mut ledger = Ledger::new(8);
        let tail = track!(ledger.seed(64))?;
        for &(size, kind) in &[
            (8, RegionKind::Hole),
            (4, RegionKind::Process),
            (8, RegionKind::Hole),
            (4, RegionKind::Process),
        ] {
            let slot = track!(ledger.split_front(tail, size))?;
            ledger.set_kind(slot, kind);
        }
        let best = Placement::new(FitStrategy::BestFit);
        assert_eq!(base_of(&ledger, best.select(&ledger, 8)), Some(0));

        ledger.set_kind(tail, RegionKind::Process);
        let worst = Placement::new(FitStrategy::WorstFit);
        assert_eq!(base_of(&ledger, worst.select(&ledger, 4)), Some(0));
        Ok(())
    }

    #[test]
    fn next_fit_resumes_from_cursor() -> TestResult {
        let mut ledger = track!(fragmented())?;
        let mut p = Placement::new(FitStrategy::NextFit);
        let first = p.select(&ledger, 8);
        assert_eq!(base_of(&ledger, first), Some(8));
        p.commit(first.unwrap());
        let tail = p.select(&ledger, 24);
        assert_eq!(base_of(&ledger, tail), Some(40));
        let tail = tail.unwrap();
        p.commit(tail);
        ledger.set_kind(tail, RegionKind::Process);

        // 末尾まで候補がないので先頭から探し直す
        let wrapped = p.select(&ledger, 12);
        let reference = Placement::new(FitStrategy::FirstFit);
        assert_eq!(wrapped, reference.select(&ledger, 12));
        assert_eq!(base_of(&ledger, wrapped), Some(8));
        p.commit(wrapped.unwrap());

        assert_eq!(p.select(&ledger, 28), None);
        assert_eq!(p.cursor, wrapped);
        Ok(())
    }

    #[test]
    fn select_does_not_move_cursor() -> TestResult {
        let ledger = track!(fragmented())?;
        let p = Placement::new(FitStrategy::NextFit);
        assert_eq!(base_of(&ledger, p.select(&ledger, 24)), Some(40));
        assert_eq!(p.cursor, None);
        assert_eq!(base_of(&ledger, p.select(&ledger, 4)), Some(8));

        let mut other = Placement::new(FitStrategy::FirstFit);
        other.commit(5);
        assert_eq!(other.cursor, None);
        Ok(())
    }

    #[test]
    fn on_reclaimed_moves_cursor() -> TestResult {
        let ledger = track!(fragmented())?;
        let mut p = Placement::new(FitStrategy::NextFit);
        let selected = p.select(&ledger, 24).unwrap();
        p.commit(selected);
        assert_eq!(p.cursor, Some(selected));
        p.on_reclaimed(selected, 5);
        assert_eq!(p.cursor, Some(5));

        // 走査位置と無関係なスロットの回収は影響しない
        p.on_reclaimed(selected, 3);
        assert_eq!(p.cursor, Some(5));
        Ok(())
    }

    #[test]
    fn strategy_names() -> TestResult {
        for &s in FitStrategy::ALL.iter() {
            let parsed: FitStrategy = track!(s.to_string().parse())?;
            assert_eq!(parsed, s);
        }
        assert_eq!(
            "any-fit".parse::<FitStrategy>().err().map(|e| *e.kind()),
            Some(ErrorKind::InvalidInput)
        );
        Ok(())
    }
}
