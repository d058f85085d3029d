//! Schema registry for the ten CNPJ dataset categories
//!
//! Every category maps to one destination table with a fixed, positional
//! column list. Source files carry no header row, so the order of the
//! columns here is the order of the fields on disk.

use crate::error::{IngestError, Result};
use serde::Serialize;

/// Default number of records read and appended per batch for the large tables
pub const DEFAULT_CHUNK_SIZE: usize = 500_000;

/// Logical record type published by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetCategory {
    Company,
    Establishment,
    Partner,
    SimplifiedTaxRegime,
    ActivityCode,
    StatusReason,
    Municipality,
    LegalNature,
    Country,
    Qualification,
}

impl DatasetCategory {
    /// All categories in load order
    pub const ALL: [DatasetCategory; 10] = [
        DatasetCategory::Company,
        DatasetCategory::Establishment,
        DatasetCategory::Partner,
        DatasetCategory::SimplifiedTaxRegime,
        DatasetCategory::ActivityCode,
        DatasetCategory::StatusReason,
        DatasetCategory::Municipality,
        DatasetCategory::LegalNature,
        DatasetCategory::Country,
        DatasetCategory::Qualification,
    ];

    pub fn schema(self) -> &'static TableSchema {
        let idx = match self {
            DatasetCategory::Company => 0,
            DatasetCategory::Establishment => 1,
            DatasetCategory::Partner => 2,
            DatasetCategory::SimplifiedTaxRegime => 3,
            DatasetCategory::ActivityCode => 4,
            DatasetCategory::StatusReason => 5,
            DatasetCategory::Municipality => 6,
            DatasetCategory::LegalNature => 7,
            DatasetCategory::Country => 8,
            DatasetCategory::Qualification => 9,
        };
        &SCHEMAS[idx]
    }

    /// Destination table name
    pub fn table(self) -> &'static str {
        self.schema().table
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DatasetCategory::Company => "company",
            DatasetCategory::Establishment => "establishment",
            DatasetCategory::Partner => "partner",
            DatasetCategory::SimplifiedTaxRegime => "simplified_tax_regime",
            DatasetCategory::ActivityCode => "activity_code",
            DatasetCategory::StatusReason => "status_reason",
            DatasetCategory::Municipality => "municipality",
            DatasetCategory::LegalNature => "legal_nature",
            DatasetCategory::Country => "country",
            DatasetCategory::Qualification => "qualification",
        }
    }
}

impl std::fmt::Display for DatasetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic type of a source column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Free text; empty becomes NULL
    Text,
    /// Nullable 32-bit integer; empty becomes NULL
    Integer,
    /// Comma-decimal amount; empty becomes zero
    Decimal,
}

impl ColumnKind {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Decimal => "DOUBLE PRECISION",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    /// Convert one decoded field into a typed value
    pub fn parse(&self, raw: String) -> Result<Value> {
        match self.kind {
            ColumnKind::Text => Ok(Value::Text(if raw.is_empty() { None } else { Some(raw) })),
            ColumnKind::Integer => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(Value::Integer(None));
                }
                trimmed
                    .parse::<i32>()
                    .map(|v| Value::Integer(Some(v)))
                    .map_err(|e| self.invalid(&raw, e.to_string()))
            },
            ColumnKind::Decimal => normalize_decimal(&raw)
                .map(Value::Decimal)
                .ok_or_else(|| self.invalid(&raw, "not a decimal amount".to_string())),
        }
    }

    fn invalid(&self, raw: &str, message: String) -> IngestError {
        IngestError::Value {
            column: self.name,
            value: raw.to_string(),
            message,
        }
    }
}

const fn text(name: &'static str) -> Column {
    Column { name, kind: ColumnKind::Text }
}

const fn int(name: &'static str) -> Column {
    Column { name, kind: ColumnKind::Integer }
}

const fn decimal(name: &'static str) -> Column {
    Column { name, kind: ColumnKind::Decimal }
}

/// How many records are read and appended together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPolicy {
    Rows(usize),
    /// Load the whole file as one batch; small reference tables only
    Whole,
}

/// Single-column index on a destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub column: &'static str,
}

/// Descriptor for one destination table
#[derive(Debug)]
pub struct TableSchema {
    pub category: DatasetCategory,
    pub table: &'static str,
    pub columns: &'static [Column],
    pub chunk: ChunkPolicy,
    pub index: Option<IndexSpec>,
}

impl TableSchema {
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Effective chunk policy; an override only resizes already chunked tables
    pub fn chunk_policy(&self, chunk_size_override: Option<usize>) -> ChunkPolicy {
        match (self.chunk, chunk_size_override) {
            (ChunkPolicy::Rows(_), Some(size)) => ChunkPolicy::Rows(size.max(1)),
            (policy, _) => policy,
        }
    }

    /// Apply the columns positionally to the decoded fields of one record
    pub fn parse_record<I>(&self, fields: I) -> Result<Row>
    where
        I: IntoIterator<Item = String>,
    {
        let mut row = Vec::with_capacity(self.columns.len());
        let mut fields = fields.into_iter();

        for column in self.columns {
            let raw = fields.next().ok_or_else(|| IngestError::Record {
                record: 0,
                message: format!("expected {} fields, found {}", self.columns.len(), row.len()),
            })?;
            row.push(column.parse(raw)?);
        }

        let extra = fields.count();
        if extra > 0 {
            return Err(IngestError::Record {
                record: 0,
                message: format!(
                    "expected {} fields, found {}",
                    self.columns.len(),
                    self.columns.len() + extra
                ),
            });
        }

        Ok(row)
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table
    pub fn create_table_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.kind.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE IF NOT EXISTS {} ({})", self.table, columns)
    }

    /// `CREATE INDEX IF NOT EXISTS` statement, when the table has an index
    pub fn create_index_sql(&self) -> Option<String> {
        self.index.map(|index| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {}({})",
                index.name, self.table, index.column
            )
        })
    }
}

/// Typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(Option<String>),
    Integer(Option<i32>),
    Decimal(f64),
}

/// One record with values in column order
pub type Row = Vec<Value>;

/// Parse a Brazilian-formatted amount
///
/// `"1.234,56"` becomes `1234.56`; when a comma is present dots are thousands
/// separators. Without a comma a dot is the decimal point, so `"1.234"` is
/// `1.234`. Empty input is zero. Returns `None` for anything else that is
/// not a finite number.
pub fn normalize_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    let parsed = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".").parse::<f64>()
    } else {
        trimmed.parse::<f64>()
    };

    parsed.ok().filter(|v| v.is_finite())
}

static EMPRESA_COLUMNS: [Column; 7] = [
    text("cnpj_basico"),
    text("razao_social"),
    int("natureza_juridica"),
    int("qualificacao_responsavel"),
    decimal("capital_social"),
    int("porte_empresa"),
    text("ente_federativo_responsavel"),
];

static ESTABELECIMENTO_COLUMNS: [Column; 30] = [
    text("cnpj_basico"),
    text("cnpj_ordem"),
    text("cnpj_dv"),
    int("identificador_matriz_filial"),
    text("nome_fantasia"),
    int("situacao_cadastral"),
    int("data_situacao_cadastral"),
    int("motivo_situacao_cadastral"),
    text("nome_cidade_exterior"),
    text("pais"),
    int("data_inicio_atividade"),
    int("cnae_fiscal_principal"),
    text("cnae_fiscal_secundaria"),
    text("tipo_logradouro"),
    text("logradouro"),
    text("numero"),
    text("complemento"),
    text("bairro"),
    text("cep"),
    text("uf"),
    int("municipio"),
    text("ddd_1"),
    text("telefone_1"),
    text("ddd_2"),
    text("telefone_2"),
    text("ddd_fax"),
    text("fax"),
    text("correio_eletronico"),
    text("situacao_especial"),
    int("data_situacao_especial"),
];

static SOCIOS_COLUMNS: [Column; 11] = [
    text("cnpj_basico"),
    int("identificador_socio"),
    text("nome_socio_razao_social"),
    text("cpf_cnpj_socio"),
    int("qualificacao_socio"),
    int("data_entrada_sociedade"),
    int("pais"),
    text("representante_legal"),
    text("nome_do_representante"),
    int("qualificacao_representante_legal"),
    int("faixa_etaria"),
];

static SIMPLES_COLUMNS: [Column; 7] = [
    text("cnpj_basico"),
    text("opcao_pelo_simples"),
    int("data_opcao_simples"),
    int("data_exclusao_simples"),
    text("opcao_mei"),
    int("data_opcao_mei"),
    int("data_exclusao_mei"),
];

static CODE_TEXT_COLUMNS: [Column; 2] = [text("codigo"), text("descricao")];

static CODE_INT_COLUMNS: [Column; 2] = [int("codigo"), text("descricao")];

const CNPJ_INDEX_COLUMN: &str = "cnpj_basico";

static SCHEMAS: [TableSchema; 10] = [
    TableSchema {
        category: DatasetCategory::Company,
        table: "empresa",
        columns: &EMPRESA_COLUMNS,
        chunk: ChunkPolicy::Rows(DEFAULT_CHUNK_SIZE),
        index: Some(IndexSpec { name: "empresa_cnpj", column: CNPJ_INDEX_COLUMN }),
    },
    TableSchema {
        category: DatasetCategory::Establishment,
        table: "estabelecimento",
        columns: &ESTABELECIMENTO_COLUMNS,
        chunk: ChunkPolicy::Rows(DEFAULT_CHUNK_SIZE),
        index: Some(IndexSpec { name: "estabelecimento_cnpj", column: CNPJ_INDEX_COLUMN }),
    },
    TableSchema {
        category: DatasetCategory::Partner,
        table: "socios",
        columns: &SOCIOS_COLUMNS,
        chunk: ChunkPolicy::Rows(DEFAULT_CHUNK_SIZE),
        index: Some(IndexSpec { name: "socios_cnpj", column: CNPJ_INDEX_COLUMN }),
    },
    TableSchema {
        category: DatasetCategory::SimplifiedTaxRegime,
        table: "simples",
        columns: &SIMPLES_COLUMNS,
        chunk: ChunkPolicy::Rows(DEFAULT_CHUNK_SIZE),
        index: Some(IndexSpec { name: "simples_cnpj", column: CNPJ_INDEX_COLUMN }),
    },
    TableSchema {
        category: DatasetCategory::ActivityCode,
        table: "cnae",
        columns: &CODE_TEXT_COLUMNS,
        chunk: ChunkPolicy::Whole,
        index: None,
    },
    TableSchema {
        category: DatasetCategory::StatusReason,
        table: "moti",
        columns: &CODE_INT_COLUMNS,
        chunk: ChunkPolicy::Whole,
        index: None,
    },
    TableSchema {
        category: DatasetCategory::Municipality,
        table: "munic",
        columns: &CODE_INT_COLUMNS,
        chunk: ChunkPolicy::Whole,
        index: None,
    },
    TableSchema {
        category: DatasetCategory::LegalNature,
        table: "natju",
        columns: &CODE_INT_COLUMNS,
        chunk: ChunkPolicy::Whole,
        index: None,
    },
    TableSchema {
        category: DatasetCategory::Country,
        table: "pais",
        columns: &CODE_INT_COLUMNS,
        chunk: ChunkPolicy::Whole,
        index: None,
    },
    TableSchema {
        category: DatasetCategory::Qualification,
        table: "quals",
        columns: &CODE_INT_COLUMNS,
        chunk: ChunkPolicy::Whole,
        index: None,
    },
];
