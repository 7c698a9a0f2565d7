// ==========================================
// 发票导入系统 - 对账导入器（编排）
// ==========================================
// 流程（逐行、单遍、无回溯）:
//   提取投影 → 规范化日期 → 客户 → 产品 → 发票 → 明细
// 写入顺序: 客户/产品 先于 发票，发票 先于 明细（无前向引用）
// 失败边界:
// - 数据源打开/首行读取失败: 不发生任何写入
// - 提取失败: 按坏行策略中止或跳过（RowFailureAction）
// - 存储失败: 始终中止
// - ALL_OR_NOTHING: 整个运行一个事务，中止即回滚
// ==========================================

use crate::config::{CommitPolicy, ImportConfig, MalformedRowPolicy};
use crate::domain::invoice::{ImportSummary, NewInvoice, NewInvoiceItem, RowProjection};
use crate::domain::types::EntityKind;
use crate::importer::cell_extractor::{columns, CellExtractor};
use crate::importer::deduplicator::{DedupKey, Deduplicator, Resolution};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::normalizer::normalize_date;
use crate::importer::row_source::{open_row_source, RawRow};
use crate::repository::invoice_store::InvoiceStore;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

// ==========================================
// RowFailureAction - 行级失败处置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFailureAction {
    Abort,
    Skip,
}

impl RowFailureAction {
    /// 依据坏行策略与错误类别决定处置方式
    ///
    /// 只有提取阶段错误（此时该行尚无写入）可以跳过；
    /// 存储失败、数据源读取失败一律中止。
    pub fn decide(policy: MalformedRowPolicy, error: &ImportError) -> Self {
        match policy {
            MalformedRowPolicy::Skip if error.is_row_extraction_error() => RowFailureAction::Skip,
            _ => RowFailureAction::Abort,
        }
    }
}

/// 已准备好写入的一行（提取 + 日期规范化均已成功）
struct PreparedRow {
    projection: RowProjection,
    invoice_date: String,
}

/// 首次出现的取值（用于检测同键不同值）
struct FirstSeenInvoice {
    invoice_date: String,
    grand_total: f64,
    customer_id: i64,
}

/// 单次运行的全部可变状态（不跨运行共享）
#[derive(Default)]
struct ImportRun {
    dedup: Deduplicator,
    summary: ImportSummary,
    addresses: HashMap<String, String>,
    prices: HashMap<String, f64>,
    invoices: HashMap<i64, FirstSeenInvoice>,
}

// ==========================================
// InvoiceImporter
// ==========================================
pub struct InvoiceImporter<S: InvoiceStore> {
    store: S,
    config: ImportConfig,
    extractor: CellExtractor,
}

impl<S: InvoiceStore> InvoiceImporter<S> {
    /// 创建导入器
    ///
    /// # 参数
    /// - store: 写入端口实现
    /// - config: 事务/坏行/工作表策略
    pub fn new(store: S, config: ImportConfig) -> Self {
        Self {
            store,
            config,
            extractor: CellExtractor::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// 导入表格文件（按扩展名选择数据源）
    pub fn import_file(&self, path: &Path) -> ImportResult<ImportSummary> {
        let source = open_row_source(path, self.config.sheet_scope)?;
        info!(path = %source.source_name(), "开始导入文件");
        self.import(source)
    }

    /// 导入一个行序列
    ///
    /// # 返回
    /// - Ok(ImportSummary): 全部行处理完成
    /// - Err(ImportError): 首个致命错误（不返回部分汇总）
    pub fn import<I>(&self, rows: I) -> ImportResult<ImportSummary>
    where
        I: IntoIterator<Item = ImportResult<RawRow>>,
    {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "invoice_import",
            run_id = %run_id,
            commit_policy = %self.config.commit_policy,
            malformed_row_policy = %self.config.malformed_row_policy
        );
        let _enter = span.enter();

        let mut rows = rows.into_iter();

        // 先读首行：数据源在任何写入前失败时直接返回
        let first = match rows.next() {
            None => {
                info!("数据源无数据行");
                return Ok(ImportSummary::default());
            }
            Some(Err(e)) => {
                error!(error_kind = e.kind(), error = %e, "数据源读取失败，未发生写入");
                return Err(e);
            }
            Some(Ok(row)) => row,
        };

        let transactional = self.config.commit_policy == CommitPolicy::AllOrNothing;
        if transactional {
            self.store.begin_run().map_err(ImportError::Transaction)?;
        }

        let mut run = ImportRun::default();
        let outcome = self
            .process_rows(std::iter::once(Ok(first)).chain(rows), &mut run)
            .and_then(|()| {
                if transactional {
                    self.store.commit_run().map_err(ImportError::Transaction)?;
                }
                Ok(())
            });

        match outcome {
            Ok(()) => {
                let summary = run.summary;
                info!(
                    customers = summary.customers,
                    products = summary.products,
                    invoices = summary.invoices,
                    invoice_items = summary.invoice_items,
                    rows_processed = summary.rows_processed,
                    skipped_rows = summary.skipped_rows,
                    "导入完成"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(
                    error_kind = e.kind(),
                    error = %e,
                    rows_processed = run.summary.rows_processed,
                    rolled_back = transactional,
                    "导入中止"
                );
                if transactional {
                    if let Err(rollback_err) = self.store.rollback_run() {
                        warn!(error = %rollback_err, "回滚失败");
                    }
                }
                Err(e)
            }
        }
    }

    fn process_rows<I>(&self, rows: I, run: &mut ImportRun) -> ImportResult<()>
    where
        I: Iterator<Item = ImportResult<RawRow>>,
    {
        for next in rows {
            let raw = next?;

            let prepared = match self.prepare_row(&raw) {
                Ok(prepared) => prepared,
                Err(e) => match RowFailureAction::decide(self.config.malformed_row_policy, &e) {
                    RowFailureAction::Skip => {
                        warn!(row = raw.row_number, error = %e, "跳过坏行");
                        run.summary.skipped_rows += 1;
                        continue;
                    }
                    RowFailureAction::Abort => return Err(e),
                },
            };

            self.apply_row(&prepared, run)?;
            run.summary.rows_processed += 1;
        }
        Ok(())
    }

    /// 提取 + 规范化（不写入）
    fn prepare_row(&self, raw: &RawRow) -> ImportResult<PreparedRow> {
        let projection = self.extractor.extract(raw)?;
        let invoice_date = normalize_date(
            projection.invoice.invoice_date_serial,
            projection.row_number,
            columns::INVOICE_DATE,
        )?;
        debug!(row = projection.row_number, invoice_number = projection.invoice.invoice_number, "行已提取");
        Ok(PreparedRow {
            projection,
            invoice_date,
        })
    }

    fn apply_row(&self, prepared: &PreparedRow, run: &mut ImportRun) -> ImportResult<()> {
        let p = &prepared.projection;
        let row = p.row_number;

        let customer_id = self.resolve_customer(p, run)?;
        let product_id = self.resolve_product(p, run)?;
        let invoice_id = self.resolve_invoice(p, &prepared.invoice_date, customer_id, run)?;

        let item = NewInvoiceItem {
            invoice_id,
            product_id,
            quantity: p.item.quantity,
            total: p.item.total,
        };
        let item_id = self
            .store
            .create_invoice_item(&item)
            .map_err(|source| storage_error(EntityKind::InvoiceItem, row, source))?;
        run.summary.invoice_items += 1;
        debug!(row, item_id, invoice_id, product_id, "明细已创建");

        Ok(())
    }

    // ===== 客户 =====
    fn resolve_customer(&self, p: &RowProjection, run: &mut ImportRun) -> ImportResult<i64> {
        let key = DedupKey::Name(p.customer.name.clone());

        match run.dedup.lookup_or_mark_pending(EntityKind::Customer, &key)? {
            Resolution::Existing(id) => {
                if let Some(first) = run.addresses.get(&p.customer.name) {
                    if first != &p.customer.address {
                        warn!(
                            row = p.row_number,
                            customer = %p.customer.name,
                            kept = %first,
                            ignored = %p.customer.address,
                            "同名客户地址不一致，保留首次出现的地址"
                        );
                    }
                }
                Ok(id)
            }
            Resolution::Pending => {
                let id = self
                    .store
                    .create_customer(&p.customer.to_new_customer())
                    .map_err(|source| storage_error(EntityKind::Customer, p.row_number, source))?;
                run.dedup.register(EntityKind::Customer, key, id)?;
                run.addresses
                    .insert(p.customer.name.clone(), p.customer.address.clone());
                run.summary.customers += 1;
                debug!(row = p.row_number, customer_id = id, name = %p.customer.name, "客户已创建");
                Ok(id)
            }
        }
    }

    // ===== 产品 =====
    fn resolve_product(&self, p: &RowProjection, run: &mut ImportRun) -> ImportResult<i64> {
        let key = DedupKey::Name(p.product.name.clone());

        match run.dedup.lookup_or_mark_pending(EntityKind::Product, &key)? {
            Resolution::Existing(id) => {
                if let Some(first) = run.prices.get(&p.product.name) {
                    if *first != p.product.price {
                        warn!(
                            row = p.row_number,
                            product = %p.product.name,
                            kept = *first,
                            ignored = p.product.price,
                            "同名产品单价不一致，保留首次出现的单价"
                        );
                    }
                }
                Ok(id)
            }
            Resolution::Pending => {
                let id = self
                    .store
                    .create_product(&p.product.to_new_product())
                    .map_err(|source| storage_error(EntityKind::Product, p.row_number, source))?;
                run.dedup.register(EntityKind::Product, key, id)?;
                run.prices.insert(p.product.name.clone(), p.product.price);
                run.summary.products += 1;
                debug!(row = p.row_number, product_id = id, name = %p.product.name, "产品已创建");
                Ok(id)
            }
        }
    }

    // ===== 发票 =====
    fn resolve_invoice(
        &self,
        p: &RowProjection,
        invoice_date: &str,
        customer_id: i64,
        run: &mut ImportRun,
    ) -> ImportResult<i64> {
        let number = p.invoice.invoice_number;
        let key = DedupKey::InvoiceNumber(number);

        match run.dedup.lookup_or_mark_pending(EntityKind::Invoice, &key)? {
            Resolution::Existing(id) => {
                if let Some(first) = run.invoices.get(&number) {
                    if first.invoice_date != invoice_date
                        || first.grand_total != p.invoice.grand_total
                        || first.customer_id != customer_id
                    {
                        warn!(
                            row = p.row_number,
                            invoice_number = number,
                            kept_date = %first.invoice_date,
                            kept_grand_total = first.grand_total,
                            "同号发票表头不一致，保留首行的日期/总额/客户"
                        );
                    }
                }
                Ok(id)
            }
            Resolution::Pending => {
                let invoice = NewInvoice {
                    invoice_date: invoice_date.to_string(),
                    customer_id,
                    grand_total: p.invoice.grand_total,
                };
                let id = self
                    .store
                    .create_invoice(&invoice)
                    .map_err(|source| storage_error(EntityKind::Invoice, p.row_number, source))?;
                run.dedup.register(EntityKind::Invoice, key, id)?;
                run.invoices.insert(
                    number,
                    FirstSeenInvoice {
                        invoice_date: invoice.invoice_date,
                        grand_total: invoice.grand_total,
                        customer_id,
                    },
                );
                run.summary.invoices += 1;
                debug!(row = p.row_number, invoice_id = id, invoice_number = number, "发票已创建");
                Ok(id)
            }
        }
    }
}

fn storage_error(
    entity: EntityKind,
    row: usize,
    source: crate::repository::error::RepositoryError,
) -> ImportError {
    ImportError::StorageWrite { entity, row, source }
}
