//! # Story Module
//!
//! Story documents: a titled narrative tree, loadable from and savable to JSON,
//! and the story that ships with the player.

use crate::errors::PlayerError;
use crate::gesture::Direction;
use crate::narrative::NarrativeNode;
use crate::script::{Cue, SceneScript, SceneScriptBuilder};
use crate::stage::Card;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

/// A complete story: window title and narrative root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub root: NarrativeNode,
}

impl Story {
    pub fn new(title: impl Into<String>, root: NarrativeNode) -> Result<Self, PlayerError> {
        root.validate()?;
        Ok(Self {
            title: title.into(),
            root,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, PlayerError> {
        let story: Story = serde_json::from_str(json)?;
        story.root.validate()?;
        Ok(story)
    }

    #[instrument(level = "debug", fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, PlayerError> {
        if !path.is_file() {
            return Err(PlayerError::AssetNotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        let story = Self::from_json(&json)?;
        debug!(scenes = story.root.scenes().len(), "Story loaded");
        Ok(story)
    }

    pub fn to_json_pretty(&self) -> Result<String, PlayerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Audio of the first scene played, required at startup.
    pub fn primary_audio(&self) -> Option<&str> {
        self.root.first_scene().and_then(SceneScript::audio)
    }

    /// "Five Centimeters per Second": title, prologue, chapter one and the
    /// branching chapter two with its four endings.
    pub fn built_in() -> Result<Self, PlayerError> {
        let chapter_two = chapter_two()?;
        let chapter_one = NarrativeNode::scene(
            SceneScript::builder("res/chapter_one.mp4")
                .audio("res/chapter_one.mp3")
                .swipe_with_prompt(Cue::Seconds(24.0), Direction::Right, "请向右滑动继续")
                .swipe_with_prompt(Cue::Seconds(27.0), Direction::RightUp, "请向右上滑动继续")
                .build()?,
            Some(NarrativeNode::card(
                Card::banner("第一章 樱花抄", "第一章 桜花抄")
                    .with_hint("故事发展会发生改变 请谨慎选择"),
                Some(chapter_two),
            )),
        );
        let root = NarrativeNode::card(
            Card::vertical("秒速五厘米", "秒速５センチメートル").with_hint("点击屏幕继续"),
            Some(NarrativeNode::card(
                Card::centered("序章").with_hint("点击继续"),
                Some(chapter_one),
            )),
        );
        Self::new("秒速五厘米", root)
    }
}

fn clip(name: &str) -> SceneScriptBuilder {
    SceneScript::builder(format!("res/{name}.mp4")).audio(format!("res/{name}.mp3"))
}

fn plain(name: &str) -> Result<SceneScript, PlayerError> {
    clip(name).build()
}

/// The station journey shared by both "move away" branches.
fn journey(door_prompt: &str) -> Result<Vec<SceneScript>, PlayerError> {
    Ok(vec![
        clip("让你来我这边车站")
            .swipe(Cue::Seconds(6.0), Direction::LeftDown)
            .build()?,
        clip("晚点").pause(Cue::Seconds(124.0), door_prompt).build()?,
        clip("下车要见明里了")
            .swipe(Cue::Seconds(4.0), Direction::Up)
            .build()?,
        clip("再次晚点")
            .swipe(Cue::Seconds(36.0), Direction::Down)
            .build()?,
        clip("火车终于等到明里")
            .swipe(Cue::Seconds(78.0), Direction::Left)
            .swipe(Cue::Seconds(93.0), Direction::Right)
            .swipe(Cue::Seconds(214.0), Direction::Up)
            .swipe_with_prompt(Cue::Seconds(338.0), Direction::Left, "请向左滑动拥抱")
            .pause(Cue::Seconds(99.0), "点击叫明里名字")
            .build()?,
    ])
}

fn ending(subtitle: &str) -> NarrativeNode {
    NarrativeNode::terminal("成就达成", subtitle)
}

fn chapter_two() -> Result<NarrativeNode, PlayerError> {
    let lost_touch = NarrativeNode::scene(
        plain("好久没联系了")?,
        Some(ending("花开花落终有时，相逢相聚本无意")),
    );

    let mut letters = vec![plain("再次写给明里")?, plain("天冷最近还好吗")?];
    letters.extend(journey("点击屏幕关闭车门")?);
    let write_back = NarrativeNode::sequence(
        letters,
        ending("樱花的秒速是每秒五厘米，那么两颗心要多久才能相遇...未完待续"),
    );
    let other_plans = NarrativeNode::scene(
        plain("一年没见")?,
        Some(ending("渐行渐远渐无书，水阔鱼沉何处问")),
    );
    let told_her = NarrativeNode::scene(
        plain("突然转学")?,
        Some(NarrativeNode::choice(vec![
            ("写信沟通", write_back),
            ("另做打算", other_plans),
        ])),
    );

    let mut kept_secret = vec![plain("谢谢你的回信")?];
    kept_secret.extend(journey("点击关上车门")?);
    let kept_secret = NarrativeNode::sequence(
        kept_secret,
        ending("樱花下落的秒速是秒速五厘米，那么两颗心要多久才能相遇...未完待续"),
    );

    let childhood = clip("小时候结识")
        .swipe(Cue::Seconds(16.0), Direction::Right)
        .swipe(Cue::Seconds(22.0), Direction::Down)
        .swipe_with_prompt(Cue::Seconds(77.0), Direction::Left, "请向左滑动牵起手")
        .swipe(Cue::Seconds(80.0), Direction::Up)
        .build()?;

    let choice = NarrativeNode::choice(vec![
        ("不再联系", lost_touch),
        ("表达转学", told_her),
        ("隐瞒转学", kept_secret),
    ]);

    Ok(NarrativeNode::scene(
        childhood,
        Some(NarrativeNode::scene(plain("给明里写信")?, Some(choice))),
    ))
}
