//! Domain models for Gastos
//!
//! Field names are English in Rust and Spanish on the wire, matching the
//! JSON contract the web frontend was built against.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a present field (including an explicit `null`) as `Some(..)`.
///
/// Combined with `#[serde(default)]` on an `Option<Option<T>>` this lets a
/// patch tell "field absent" (`None`) apart from "set to null" (`Some(None)`).
fn deserialize_some<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// ========== Categories ==========

pub const DEFAULT_CATEGORY_COLOR: &str = "#3B82F6";
pub const DEFAULT_CATEGORY_ICON: &str = "💰";

fn default_category_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

fn default_category_icon() -> String {
    DEFAULT_CATEGORY_ICON.to_string()
}

/// A budget category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "presupuesto_mensual")]
    pub monthly_budget: f64,
    pub color: String,
    #[serde(rename = "icono")]
    pub icon: String,
}

/// A category together with its subcategories
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithSubcategories {
    #[serde(flatten)]
    pub category: Category,
    #[serde(rename = "subcategorias")]
    pub subcategories: Vec<Subcategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "presupuesto_mensual", default)]
    pub monthly_budget: f64,
    #[serde(default = "default_category_color")]
    pub color: String,
    #[serde(rename = "icono", default = "default_category_icon")]
    pub icon: String,
}

impl NewCategory {
    /// A category with the default color, icon and a zero budget
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            monthly_budget: 0.0,
            color: default_category_color(),
            icon: default_category_icon(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryUpdate {
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "presupuesto_mensual")]
    pub monthly_budget: Option<f64>,
    pub color: Option<String>,
    #[serde(rename = "icono")]
    pub icon: Option<String>,
}

/// A subcategory within a budget category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "categoria_id")]
    pub category_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubcategory {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "categoria_id")]
    pub category_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubcategoryUpdate {
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "categoria_id")]
    pub category_id: Option<i64>,
}

// ========== Banks and payment methods ==========

/// A bank (institution)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "activo")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBank {
    #[serde(rename = "nombre")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BankUpdate {
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "activo")]
    pub active: Option<bool>,
}

/// Kind of payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethodType {
    #[serde(rename = "Débito", alias = "Debito", alias = "débito", alias = "debito", alias = "debit")]
    Debit,
    #[serde(rename = "Crédito", alias = "Credito", alias = "crédito", alias = "credito", alias = "credit")]
    Credit,
}

impl PaymentMethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "Débito",
            Self::Credit => "Crédito",
        }
    }
}

impl std::str::FromStr for PaymentMethodType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "débito" | "debito" | "debit" => Ok(Self::Debit),
            "crédito" | "credito" | "credit" => Ok(Self::Credit),
            _ => Err(format!("Unknown payment method type: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentMethodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A card or other payment method issued by a bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: i64,
    #[serde(rename = "tipo")]
    pub method_type: PaymentMethodType,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "banco_id")]
    pub bank_id: i64,
    #[serde(rename = "activo")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPaymentMethod {
    #[serde(rename = "tipo")]
    pub method_type: PaymentMethodType,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "banco_id")]
    pub bank_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentMethodUpdate {
    #[serde(rename = "tipo")]
    pub method_type: Option<PaymentMethodType>,
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "banco_id")]
    pub bank_id: Option<i64>,
    #[serde(rename = "activo")]
    pub active: Option<bool>,
}

// ========== Bank accounts ==========

/// A bank account with cached balances
///
/// The balances are maintained by the income/transfer ledger:
/// `total_balance` tracks `savings_balance + transactional_balance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "banco_id")]
    pub bank_id: i64,
    #[serde(rename = "saldo_total")]
    pub total_balance: f64,
    /// Money set aside; not touched by spending
    #[serde(rename = "saldo_ahorro")]
    pub savings_balance: f64,
    /// Money available for expenses and transfers
    #[serde(rename = "saldo_transaccional")]
    pub transactional_balance: f64,
    #[serde(rename = "activa")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBankAccount {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "banco_id")]
    pub bank_id: i64,
    /// Defaults to `savings_balance + transactional_balance` when absent
    #[serde(rename = "saldo_total", default)]
    pub total_balance: Option<f64>,
    #[serde(rename = "saldo_ahorro", default)]
    pub savings_balance: f64,
    #[serde(rename = "saldo_transaccional", default)]
    pub transactional_balance: f64,
}

impl NewBankAccount {
    /// The opening total, derived from the parts unless given explicitly
    pub fn opening_total(&self) -> f64 {
        self.total_balance
            .unwrap_or(self.savings_balance + self.transactional_balance)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BankAccountUpdate {
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "banco_id")]
    pub bank_id: Option<i64>,
    #[serde(rename = "saldo_total")]
    pub total_balance: Option<f64>,
    #[serde(rename = "saldo_ahorro")]
    pub savings_balance: Option<f64>,
    #[serde(rename = "saldo_transaccional")]
    pub transactional_balance: Option<f64>,
    #[serde(rename = "activa")]
    pub active: Option<bool>,
}

/// Balance totals across all active accounts
#[derive(Debug, Clone, Serialize)]
pub struct AccountsSummary {
    #[serde(rename = "total_general")]
    pub total: f64,
    #[serde(rename = "total_ahorro")]
    pub savings: f64,
    #[serde(rename = "total_transaccional")]
    pub transactional: f64,
    #[serde(rename = "cuentas")]
    pub accounts: Vec<BankAccount>,
}

// ========== Incomes ==========

/// Which balance an income credits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IncomeType {
    #[default]
    #[serde(rename = "transaccional", alias = "transactional")]
    Transactional,
    #[serde(rename = "ahorro", alias = "savings")]
    Savings,
}

impl IncomeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transactional => "transaccional",
            Self::Savings => "ahorro",
        }
    }
}

impl std::str::FromStr for IncomeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "transaccional" | "transactional" => Ok(Self::Transactional),
            "ahorro" | "savings" => Ok(Self::Savings),
            _ => Err(format!("Unknown income type: {}", s)),
        }
    }
}

impl std::fmt::Display for IncomeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Money deposited into a bank account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "cuenta_bancaria_id")]
    pub account_id: i64,
    #[serde(rename = "tipo")]
    pub income_type: IncomeType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIncome {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "cuenta_bancaria_id")]
    pub account_id: i64,
    #[serde(rename = "tipo", default)]
    pub income_type: IncomeType,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomeUpdate {
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "monto")]
    pub amount: Option<f64>,
    #[serde(rename = "fecha")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "cuenta_bancaria_id")]
    pub account_id: Option<i64>,
    #[serde(rename = "tipo")]
    pub income_type: Option<IncomeType>,
}

// ========== Transfers ==========

/// Movement of transactional funds between two accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,
    #[serde(rename = "cuenta_origen_id")]
    pub origin_account_id: i64,
    #[serde(rename = "cuenta_destino_id")]
    pub destination_account_id: i64,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTransfer {
    #[serde(rename = "cuenta_origen_id")]
    pub origin_account_id: i64,
    #[serde(rename = "cuenta_destino_id")]
    pub destination_account_id: i64,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
}

// ========== Expenses ==========

/// A recorded outflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "categoria_id")]
    pub category_id: i64,
    #[serde(rename = "subcategoria_id")]
    pub subcategory_id: Option<i64>,
    #[serde(rename = "medio_pago_id")]
    pub payment_method_id: Option<i64>,
    #[serde(rename = "banco_id")]
    pub bank_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// An expense with its category and subcategory resolved
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseDetail {
    #[serde(flatten)]
    pub expense: Expense,
    #[serde(rename = "categoria")]
    pub category: Category,
    #[serde(rename = "subcategoria")]
    pub subcategory: Option<Subcategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewExpense {
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "categoria_id")]
    pub category_id: i64,
    #[serde(rename = "subcategoria_id", default)]
    pub subcategory_id: Option<i64>,
    #[serde(rename = "medio_pago_id", default)]
    pub payment_method_id: Option<i64>,
    #[serde(rename = "banco_id", default)]
    pub bank_id: Option<i64>,
}

/// Partial update of an expense
///
/// Optional references use `Option<Option<_>>`: `None` leaves the column
/// untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseUpdate {
    #[serde(rename = "fecha")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "monto")]
    pub amount: Option<f64>,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "categoria_id")]
    pub category_id: Option<i64>,
    #[serde(
        rename = "subcategoria_id",
        default,
        deserialize_with = "deserialize_some"
    )]
    pub subcategory_id: Option<Option<i64>>,
    #[serde(rename = "medio_pago_id", default, deserialize_with = "deserialize_some")]
    pub payment_method_id: Option<Option<i64>>,
    #[serde(rename = "banco_id", default, deserialize_with = "deserialize_some")]
    pub bank_id: Option<Option<i64>>,
}

/// Equality filters for listing expenses
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ExpenseFilter {
    #[serde(rename = "categoria_id")]
    pub category_id: Option<i64>,
    /// Calendar month, 1-12
    #[serde(rename = "mes")]
    pub month: Option<u32>,
    #[serde(rename = "anio")]
    pub year: Option<i32>,
}

/// Skip/limit pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "Pagination::default_limit")]
    pub limit: i64,
}

impl Pagination {
    fn default_limit() -> i64 {
        100
    }

    /// Upper bound on a single page
    pub const MAX_LIMIT: i64 = 1000;

    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }

    /// Offset clamped to >= 0
    pub fn offset(&self) -> i64 {
        self.skip.max(0)
    }

    /// Limit clamped to 1..=MAX_LIMIT
    pub fn page_size(&self) -> i64 {
        self.limit.clamp(1, Self::MAX_LIMIT)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::default_limit(),
        }
    }
}

// ========== Reports ==========

/// Earliest year accepted by the monthly report and expense filters
pub const MIN_REPORT_YEAR: i32 = 2000;

/// Budget vs. actual for one category in a month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBudgetLine {
    #[serde(rename = "categoria_id")]
    pub category_id: i64,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "presupuesto_mensual")]
    pub monthly_budget: f64,
    #[serde(rename = "total_gastado")]
    pub spent: f64,
    #[serde(rename = "diferencia")]
    pub difference: f64,
    #[serde(rename = "porcentaje_usado")]
    pub percent_used: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetTotals {
    #[serde(rename = "presupuesto_total")]
    pub budget: f64,
    #[serde(rename = "gastado_total")]
    pub spent: f64,
    #[serde(rename = "diferencia_total")]
    pub difference: f64,
}

/// Monthly budget report across every category
#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
    #[serde(rename = "mes")]
    pub month: u32,
    #[serde(rename = "anio")]
    pub year: i32,
    #[serde(rename = "categorias")]
    pub categories: Vec<CategoryBudgetLine>,
    #[serde(rename = "totales")]
    pub totals: BudgetTotals,
}

/// Counts of rows inserted by default-data seeding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub categories_created: usize,
    pub banks_created: usize,
}
