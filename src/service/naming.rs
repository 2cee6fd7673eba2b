use std::collections::HashSet;

/// Excel 工作表名称长度上限
pub const SHEET_NAME_MAX_LEN: usize = 31;
/// 拆分文件名主干上限 (UTF-8 字节)，加上 ".xlsx" 仍低于常见文件系统的 255 字节
pub const FILE_STEM_MAX_BYTES: usize = 200;

const WINDOWS_DEVICE_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// 销售员名称 -> 合法文件名主干 (不含扩展名)
pub fn sanitize_file_stem(key: &str) -> String {
    let replaced: String = key
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim().trim_end_matches(['.', ' ']);

    let stem = if trimmed.is_empty() {
        "vendedor".to_string()
    } else if WINDOWS_DEVICE_NAMES
        .iter()
        .any(|d| d.eq_ignore_ascii_case(trimmed.split('.').next().unwrap_or(trimmed)))
    {
        format!("_{}", trimmed)
    } else {
        trimmed.to_string()
    };
    truncate_bytes(&stem, FILE_STEM_MAX_BYTES)
        .trim_end_matches(['.', ' '])
        .to_string()
}

/// 销售员名称 -> 合法工作表名 (长度由 NameRegistry 截断)
pub fn sanitize_sheet_name(key: &str) -> String {
    let replaced: String = key
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim().trim_matches('\'');
    if trimmed.is_empty() {
        "Vendedor".to_string()
    } else {
        trimmed.to_string()
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// 按字节截断，只在字符边界处切
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[derive(Debug, Clone, Copy)]
enum Limit {
    /// 字符数 (工作表名)
    Chars(usize),
    /// UTF-8 字节数 (文件名)
    Bytes(usize),
}

/// 名称分配器：大小写不敏感去重，冲突时追加 " (2)"、" (3)"…
///
/// 截断发生在追加后缀之前，结果总在长度上限内。
#[derive(Debug, Default)]
pub struct NameRegistry {
    taken: HashSet<String>,
    limit: Option<Limit>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            taken: HashSet::new(),
            limit: Some(Limit::Chars(max_len)),
        }
    }

    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            taken: HashSet::new(),
            limit: Some(Limit::Bytes(max_bytes)),
        }
    }

    /// 预留固定名称 (如 "Resumo")
    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_lowercase());
    }

    pub fn allocate(&mut self, base: &str) -> String {
        let first = self.fit(base, "");
        if self.taken.insert(first.to_lowercase()) {
            return first;
        }

        let mut n = 2usize;
        loop {
            let candidate = self.fit(base, &format!(" ({})", n));
            if self.taken.insert(candidate.to_lowercase()) {
                tracing::warn!("Name '{}' already taken, using '{}'", base, candidate);
                return candidate;
            }
            n += 1;
        }
    }

    fn fit(&self, base: &str, suffix: &str) -> String {
        let head = match self.limit {
            Some(Limit::Chars(max)) => {
                truncate_chars(base, max.saturating_sub(suffix.chars().count()))
            }
            Some(Limit::Bytes(max)) => truncate_bytes(base, max.saturating_sub(suffix.len())),
            None => base,
        };
        format!("{}{}", head.trim_end_matches(['.', ' ']), suffix)
    }
}
