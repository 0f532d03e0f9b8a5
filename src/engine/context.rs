use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("정규식 컴파일 실패"));

/// `${VAR}` 치환에 실패한 경우의 오류이다.
#[derive(Debug, thiserror::Error)]
#[error("{field} 필드의 변수 {name}을(를) 찾을 수 없습니다.")]
pub struct UnknownVariable {
    pub field: String,
    pub name: String,
}

/// setup/cleanup 동작을 구성할 때 사용하는 명시적 변수 저장소이다.
///
/// 프로세스 환경 변수는 직접 읽지 않는다. `HOME` 같은 값은 시작 시점에
/// 호출자가 넣어 준다.
#[derive(Debug, Clone, Default)]
pub struct DemoVars {
    vars: BTreeMap<String, String>,
}

impl DemoVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// 변수 값을 설정한다. 같은 이름이 있으면 덮어쓴다.
    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    /// 다른 변수 집합의 값을 덮어쓴다.
    pub fn merge(&mut self, other: &DemoVars) {
        for (key, value) in &other.vars {
            self.vars.insert(key.clone(), value.clone());
        }
    }

    /// `${VAR}` 패턴을 실제 값으로 치환한다.
    ///
    /// # 매개변수
    /// - `template`: 치환할 원본 문자열.
    /// - `field`: 오류 메시지에 표시할 필드 이름.
    ///
    /// # 반환값
    /// 모든 변수가 정의되어 있으면 치환된 문자열, 하나라도 없으면 첫 번째 누락 변수 오류.
    pub fn expand(&self, template: &str, field: &str) -> Result<String, UnknownVariable> {
        if let Some(missing) = PLACEHOLDER
            .captures_iter(template)
            .map(|caps| caps[1].to_string())
            .find(|name| !self.vars.contains_key(name))
        {
            return Err(UnknownVariable {
                field: field.to_string(),
                name: missing,
            });
        }
        let result = PLACEHOLDER.replace_all(template, |caps: &regex::Captures| {
            self.vars.get(&caps[1]).cloned().unwrap_or_default()
        });
        Ok(result.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_known_variables() {
        let mut vars = DemoVars::new();
        vars.set_var("HOME", "/home/demo");
        vars.set_var("NAMESPACE", "oss-21");
        let out = vars
            .expand("${HOME}/.cache/kubewarden ${NAMESPACE}", "remove")
            .expect("치환 성공");
        assert_eq!(out, "/home/demo/.cache/kubewarden oss-21");
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let vars = DemoVars::new();
        let err = vars.expand("${HOME}/.cache", "remove").unwrap_err();
        assert_eq!(err.name, "HOME");
        assert_eq!(err.field, "remove");
    }

    #[test]
    fn merge_overrides_existing_values() {
        let mut base = DemoVars::new();
        base.set_var("NAMESPACE", "oss-21");
        let mut overrides = DemoVars::new();
        overrides.set_var("NAMESPACE", "staging");
        base.merge(&overrides);
        assert_eq!(base.get_var("NAMESPACE"), Some("staging"));
    }
}
