//! 割当済み領域を開始アドレスから引くためのインデックス.
use std::collections::BTreeMap;

use super::SlotIndex;
use crate::Address;

/// 割当済み(`RegionKind::Process`)領域の位置情報を保持するインデックス.
///
/// 開始アドレスと、その領域を保持する台帳スロットの対応を管理する.
/// 空き領域はここには登録されないため、二重解放は検索失敗として検出される.
#[derive(Debug, Clone, Default)]
pub struct ProcessIndex {
    map: BTreeMap<Address, SlotIndex>,
}
impl ProcessIndex {
    /// 新しい`ProcessIndex`インスタンスを生成する.
    pub fn new() -> Self {
        ProcessIndex {
            map: BTreeMap::new(),
        }
    }

    /// 指定アドレスから始まる割当済み領域のスロットを検索する.
    pub fn get(&self, address: Address) -> Option<SlotIndex> {
        self.map.get(&address).cloned()
    }

    /// 割当済み領域を登録する.
    pub fn insert(&mut self, address: Address, slot: SlotIndex) {
        self.map.insert(address, slot);
    }

    /// 割当済み領域の登録を解除する.
    pub fn remove(&mut self, address: Address) -> Option<SlotIndex> {
        self.map.remove(&address)
    }

    /// 登録数を返す.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// 全ての登録を削除する.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() {
        let mut index = ProcessIndex::new();
        index.insert(Address::from(0), 3);
        index.insert(Address::from(16), 1);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(Address::from(16)), Some(1));
        assert_eq!(index.get(Address::from(8)), None);

        assert_eq!(index.remove(Address::from(16)), Some(1));
        assert_eq!(index.remove(Address::from(16)), None);
        assert_eq!(index.len(), 1);

        index.clear();
        assert_eq!(index.len(), 0);
    }
}
