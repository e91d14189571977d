//! # テーブルエンティティ
//!
//! データベースのテーブルに対応するエンティティの名前を定義する。
//! 実際のテーブル名への変換（プレフィックス付与、snake_case 化）は
//! インフラ層の命名規則が担当する。

/// テーブルに永続化されるエンティティ
pub trait TableEntity {
    /// エンティティ名（CamelCase）
    ///
    /// 例: `"Uid"`, `"UserAccount"`
    const ENTITY_NAME: &'static str;
}
