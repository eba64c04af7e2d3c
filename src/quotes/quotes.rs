// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use chrono::Utc;
use rand::RngExt;

use crate::{
    cfg::config::PowConfig,
    hashcash::{HashcashError, header::Header},
};

const QUOTES: &[&str] = &[
    "\u{201c}Voice is not just the sound that comes from your throat, but the feelings that come from your words.\u{201d}\n\u{2015} Jennifer Donnelly, A Northern Light",
    "\u{201c}Quit being so hard on yourself. We are what we are; we love what we love. We don't need to justify it to anyone... not even to ourselves.\u{201d}\n\u{2015} Scott Lynch, The Republic of Thieves",
    "\u{201c}I like to listen. I have learned a great deal from listening carefully. Most people never listen.\u{201d}\n\u{2015} Ernest Hemingway",
    "\u{201c}There isn't any questioning the fact that some people enter your life, at the exact point of need, want or desire - it's sometimes a coincendence and most times fate, but whatever it is, I am certain it came to make me smile.\u{201d}\n\u{2015} Nikki Rowe",
    "\u{201c}look for a long time at what pleases you, and longer still at what pains you...\u{201d}\n\u{2015} Colette",
    "\u{201c}Socrates: Have you noticed on our journey how often the citizens of this new land remind each other it is a free country?\nPlato: I have, and think it odd they do this.\nSocrates: How so, Plato?\nPlato: It is like reminding a baker he is a baker, or a sculptor he is a\nsculptor.\nSocrates: You mean to say if someone is convinced of their trade, they have\nno need to be reminded.\nPlato: That is correct.\nSocrates: I agree. If these citizens were convinced of their freedom, they would not need reminders.\u{201d}\n\u{2015} E.A. Bucchianeri, Brushstrokes of a Gadfly,",
    "\u{201c}The worst part of being okay is that okay is far from happy.\u{201d}\n\u{2015} Anna Todd",
    "\u{201c}Take care of your words and the words will take care of you.\u{201d}\n\u{2015} Amit Ray",
    "\u{201c}The only way to get what you want is to make them more afraid of you than they are of each other.\u{201d}\n\u{2015} Cinda Williams Chima, The Crimson Crown",
    "\u{201c}There is something incredibly beautiful about a woman, who knows herself, she can't break, she just falls but in every fall she rises, past who she was before.\u{201d}\n\u{2015} Nikki Rowe",
    "\u{201c}Success in life is not for those who run fast, but for those who keep running and always on the move.\u{201d}\n\u{2015} Bangambiki Habyarimana, Pearls Of Eternity",
    "\u{201c}You push the TRUTH off a cliff, but it will always fly. You can submerge the TRUTH under water, but it will not drown. You can place the TRUTH in the fire, but it will survive. You can bury the TRUTH beneath the ground, but it will arise. TRUTH always prevails!\u{201d}\n\u{2015} Amaka Imani Nkosazana, Heart Crush",
    "\u{201c}Oh darling, your only too wild, to those whom are to tame, don't let opinions change you.\u{201d}\n\u{2015} Nikki Rowe",
    "\u{201c}Healing is more about accepting the pain and finding a way to peacefully co-exist with it. In the sea of life, pain is a tide that will ebb and weave, continually.\n\nWe need to learn how to let it wash over us, without drowning in it. Our life doesn't have to end where the pain begins, but rather, it is where we start to mend.\u{201d}\n\u{2015} Jaeda DeWalt",
    "\u{201c}Your life is a movie. You are the main character. You say your scripts and act to your lines. Of course you do your lines in each scene. There is a hidden camera and a director who you can ask for help anytime up above.\u{201d}\n\u{2015} Happy Positivity",
];

/// Issues challenges and serves the quotation table.
#[derive(Debug, Clone)]
pub struct Quotes {
    config: PowConfig,
}

impl Quotes {
    pub fn new(config: PowConfig) -> Self {
        Self { config }
    }

    /// A fresh challenge for `subject`, expiring TTL from now.
    pub fn make_challenge(&self, subject: &str) -> Result<Header, HashcashError> {
        let expired_at =
            Utc::now().timestamp() + self.config.expired_duration.as_secs() as i64;

        Header::generate(subject, self.config.difficult, expired_at)
    }

    /// A uniformly random quotation.
    pub fn get_resource(&self) -> Result<String> {
        let idx = rand::rng().random_range(0..QUOTES.len());

        Ok(QUOTES[idx].to_string())
    }
}
