// ==========================================
// 发票导入系统 - 运行内实体去重
// ==========================================
// 职责: 客户名称 / 产品名称 / 发票号 → 已分配 id 的三张运行内索引
// 协议: lookup_or_mark_pending 返回 Pending 后，调用方须先创建实体，
//       再 register 新 id，之后才能处理下一个同类实体
// 生命周期: 每次导入运行新建，运行结束即丢弃（不跨运行、不查存储）
// ==========================================

use crate::domain::types::EntityKind;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

/// 去重键（自然标识）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    Name(String),       // 客户/产品名称（精确匹配，区分大小写）
    InvoiceNumber(i64), // 发票号
}

/// 查找结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// 本次运行已创建，复用该 id
    Existing(i64),
    /// 未见过，调用方负责创建并登记
    Pending,
}

#[derive(Debug, Default)]
struct KindIndex {
    ids: HashMap<DedupKey, i64>,
    pending: Option<DedupKey>,
}

#[derive(Debug, Default)]
pub struct Deduplicator {
    customers: KindIndex,
    products: KindIndex,
    invoices: KindIndex,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&self, kind: EntityKind, key: &DedupKey) -> ImportResult<&KindIndex> {
        match (kind, key) {
            (EntityKind::Customer, DedupKey::Name(_)) => Ok(&self.customers),
            (EntityKind::Product, DedupKey::Name(_)) => Ok(&self.products),
            (EntityKind::Invoice, DedupKey::InvoiceNumber(_)) => Ok(&self.invoices),
            _ => Err(ImportError::InternalError(format!(
                "{} 不支持去重键 {:?}",
                kind, key
            ))),
        }
    }

    fn index_mut(&mut self, kind: EntityKind, key: &DedupKey) -> ImportResult<&mut KindIndex> {
        self.index(kind, key)?;
        Ok(match kind {
            EntityKind::Customer => &mut self.customers,
            EntityKind::Product => &mut self.products,
            _ => &mut self.invoices,
        })
    }

    /// 查找已创建的 id；未见过则标记为待登记
    ///
    /// # 返回
    /// - Existing(id): 本次运行已创建
    /// - Pending: 未见过（已记为该类别的待登记键）
    /// - Err(InternalError): 该类别仍有未登记的待创建键
    pub fn lookup_or_mark_pending(
        &mut self,
        kind: EntityKind,
        key: &DedupKey,
    ) -> ImportResult<Resolution> {
        let index = self.index_mut(kind, key)?;

        if let Some(id) = index.ids.get(key) {
            return Ok(Resolution::Existing(*id));
        }

        if let Some(previous) = &index.pending {
            return Err(ImportError::InternalError(format!(
                "{} 待登记键 {:?} 尚未登记，不能处理 {:?}",
                kind, previous, key
            )));
        }

        index.pending = Some(key.clone());
        Ok(Resolution::Pending)
    }

    /// 登记新创建实体的 id
    pub fn register(&mut self, kind: EntityKind, key: DedupKey, id: i64) -> ImportResult<()> {
        let index = self.index_mut(kind, &key)?;

        if index.pending.as_ref() != Some(&key) {
            return Err(ImportError::InternalError(format!(
                "{} 登记的键 {:?} 未经查找标记",
                kind, key
            )));
        }

        index.pending = None;
        index.ids.insert(key, id);
        Ok(())
    }

    /// 某类别已登记的实体数
    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Customer => self.customers.ids.len(),
            EntityKind::Product => self.products.ids.len(),
            EntityKind::Invoice => self.invoices.ids.len(),
            EntityKind::InvoiceItem => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.customers.ids.is_empty() && self.products.ids.is_empty() && self.invoices.ids.is_empty()
    }
}
